//! notify-check - acceptance run for the role-aware notifications table.
//!
//! Usage: `notify-check [config.toml]`. Exits 0 when every check passes, 1 otherwise.

use restodb_notify::harness::ValidationHarness;
use restodb_notify::{Config, Database, telemetry};
use tracing::{Instrument, error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "notify.toml".to_string());

    let config = Config::load_or_default(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    let db = Database::open(&config.database).await.map_err(|e| {
        error!(path = %config.database.path, error = %e, "Error opening database");
        e
    })?;

    let result = ValidationHarness::new(&db, &config.harness)
        .run()
        .instrument(telemetry::spans::harness(&config.database.path))
        .await;

    db.close().await;

    if let Err(e) = &result {
        println!("\n❌ Test failed: {e}");
        error!(error = %e, code = e.error_code(), "Validation harness failed");
    }
    result?;
    Ok(())
}
