//! Database module for the notification datastore.
//!
//! Provides async SQLite access using SQLx for:
//! - The connection manager ([`Database`]), a scoped single-connection handle
//! - The statement executor ([`executor`]) shared by every component
//! - The notification schema migration ([`SchemaMigrator`])
//! - The notification store ([`NotificationRepository`])

pub mod executor;
mod migrate;
mod notifications;
pub mod schema;

pub use crate::error::DbError;
pub use migrate::{MigrationOutcome, MigrationReport, SchemaMigrator};
pub use notifications::{
    Notification, NotificationCategory, NotificationDraft, NotificationRepository, Recipient,
    RecipientRole,
};

use crate::config::DatabaseConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database handle over a single-connection pool.
///
/// Every component issues its statements through this one connection, in
/// program order. Call [`Database::close`] before the process exits.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Open the datastore described by `config`.
    ///
    /// Foreign keys are not enforced: the restaurant, booking and order
    /// tables belong to other parts of the application and may be absent,
    /// and legacy rows may reference deleted records.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = if config.path == ":memory:" {
            // Uniquely named shared-cache memory database per call so parallel
            // tests never see each other's tables.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:restodb-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true)
                .foreign_keys(false);

            Self::connect(options).await?
        } else {
            if config.create_if_missing
                && let Some(parent) = Path::new(&config.path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(config.create_if_missing)
                .foreign_keys(false);

            Self::connect(options).await?
        };

        info!(path = %config.path, "Connected to SQLite database");

        if config.integrity_check {
            Self::check_integrity(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Open a database at `path`, creating it if needed.
    ///
    /// Shorthand used by tests and tooling; `":memory:"` gives a private
    /// in-memory database.
    pub async fn open_path(path: &str) -> Result<Self, DbError> {
        Self::open(&DatabaseConfig {
            path: path.to_string(),
            create_if_missing: true,
            integrity_check: true,
        })
        .await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<SqlitePool, DbError> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(None)
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(DbError::Connection)
    }

    async fn check_integrity(pool: &SqlitePool) -> Result<(), DbError> {
        let integrity_result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(pool)
            .await
            .map_err(DbError::Connection)?;

        if integrity_result != "ok" {
            tracing::error!(
                integrity_check = %integrity_result,
                "Database integrity check FAILED - corruption detected!"
            );
            return Err(DbError::Connection(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Database integrity check failed: {}", integrity_result),
            ))));
        }

        tracing::debug!("Database integrity check passed");
        Ok(())
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get notification repository.
    pub fn notifications(&self) -> NotificationRepository<'_> {
        NotificationRepository::new(&self.pool)
    }

    /// Get the notification schema migrator.
    pub fn migrator(&self) -> SchemaMigrator<'_> {
        SchemaMigrator::new(&self.pool)
    }

    /// Release the connection. Waits for in-flight statements to finish.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}
