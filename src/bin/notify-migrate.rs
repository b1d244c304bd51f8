//! notify-migrate - reshape the notifications table for multiple recipient roles.
//!
//! Usage: `notify-migrate [config.toml]`. Exits 0 on success, 1 on any failure.

use restodb_notify::db::MigrationOutcome;
use restodb_notify::{Config, Database, telemetry};
use tracing::{Instrument, error, info};

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

    info!("Starting notifications schema fix");
    let result = db
        .migrator()
        .migrate()
        .instrument(telemetry::spans::migration(&config.database.path))
        .await;

    // Released on success and failure alike.
    db.close().await;

    let report = result.map_err(|e| {
        error!(error = %e, code = e.error_code(), "Error fixing notifications schema");
        e
    })?;

    match report.outcome {
        MigrationOutcome::Migrated => {
            println!("✅ Notifications schema fixed successfully! ({} rows migrated)", report.rows_copied);
            println!("✅ Notifications now support customers, admins, and super admins!");
        }
        MigrationOutcome::Resumed => {
            println!("✅ Interrupted migration completed ({} rows migrated)", report.rows_copied);
        }
        MigrationOutcome::AlreadyMigrated => {
            println!("✅ Notifications schema already supports recipient roles; nothing to do");
        }
    }

    Ok(())
}
