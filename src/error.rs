//! Unified error handling for restodb-notify.
//!
//! Two layers: [`DbError`] for everything that touches the datastore, and
//! [`HarnessError`] for the acceptance run that sits on top of it. Binaries
//! wrap both in `anyhow` at the outermost level.

use thiserror::Error;

// ============================================================================
// Database Errors (connection, statements, migration, store boundary)
// ============================================================================

/// Errors raised by the connection manager, statement executor, migrator and
/// notification store.
#[derive(Debug, Error)]
pub enum DbError {
    /// The datastore file could not be opened or failed its integrity check.
    #[error("connection error: {0}")]
    Connection(sqlx::Error),

    /// A DDL/DML/query statement failed.
    #[error("statement error: {0}")]
    Statement(#[from] sqlx::Error),

    /// Migration precondition or post-copy verification failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// A write was rejected before reaching the datastore.
    #[error("validation error: {0}")]
    Validation(String),

    /// A recipient role outside the enumerated set.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
}

impl DbError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_error",
            Self::Statement(_) => "statement_error",
            Self::Migration(_) => "migration_error",
            Self::Validation(_) => "validation_error",
            Self::IntegrityViolation(_) => "integrity_violation",
        }
    }
}

// ============================================================================
// Harness Errors (acceptance run)
// ============================================================================

/// Errors that abort a validation harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// A fixture the harness does not create itself is absent.
    #[error("missing fixture: {0}")]
    MissingFixture(String),

    /// An expectation about the stored notifications did not hold.
    #[error("check failed: {0}")]
    CheckFailed(String),
}

impl HarnessError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Db(e) => e.error_code(),
            Self::MissingFixture(_) => "missing_fixture",
            Self::CheckFailed(_) => "check_failed",
        }
    }
}
