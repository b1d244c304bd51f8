//! Tracing setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to `info`. Set `RESTODB_LOG_FORMAT=json`
/// for one JSON object per line.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RESTODB_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span covering one migration run against `path`.
    pub fn migration(path: &str) -> Span {
        info_span!("migration", path = %path)
    }

    /// Span covering one validation harness run against `path`.
    pub fn harness(path: &str) -> Span {
        info_span!("harness", path = %path)
    }
}
