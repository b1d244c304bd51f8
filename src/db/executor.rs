//! Statement executor.
//!
//! Thin typed wrapper over SQLx that every component uses to talk to the
//! datastore. `execute` is for DDL/DML (no result rows); the `fetch_*`
//! functions return rows. All of them are generic over the executor, so the
//! same call works against the pool, a pooled connection, or `&mut *tx`
//! inside a transaction. Failures surface as [`DbError::Statement`].

use super::DbError;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Execute, FromRow, Sqlite, SqliteExecutor};
use tracing::trace;

/// A bound statement with no typed output.
pub type Statement<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A bound statement whose rows decode into `O`.
pub type RowStatement<'q, O> = QueryAs<'q, Sqlite, O, SqliteArguments<'q>>;

/// A bound statement returning a single column.
pub type ScalarStatement<'q, O> = QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>;

/// Result of an `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Rowid of the last successful INSERT on this connection.
    pub last_insert_id: i64,
}

/// Run a statement that produces no rows.
pub async fn execute<'c, E>(executor: E, statement: Statement<'_>) -> Result<ExecOutcome, DbError>
where
    E: SqliteExecutor<'c>,
{
    trace!(sql = statement.sql(), "execute");
    let result = statement.execute(executor).await?;
    Ok(ExecOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: result.last_insert_rowid(),
    })
}

/// Run a query and decode every row.
pub async fn fetch_all<'c, E, O>(executor: E, statement: RowStatement<'_, O>) -> Result<Vec<O>, DbError>
where
    E: SqliteExecutor<'c>,
    O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
{
    trace!(sql = statement.sql(), "fetch_all");
    Ok(statement.fetch_all(executor).await?)
}

/// Run a query and decode the first row, if any.
pub async fn fetch_optional<'c, E, O>(
    executor: E,
    statement: RowStatement<'_, O>,
) -> Result<Option<O>, DbError>
where
    E: SqliteExecutor<'c>,
    O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
{
    trace!(sql = statement.sql(), "fetch_optional");
    Ok(statement.fetch_optional(executor).await?)
}

/// Run a query returning exactly one row and take its first column.
pub async fn fetch_scalar<'c, E, O>(
    executor: E,
    statement: ScalarStatement<'_, O>,
) -> Result<O, DbError>
where
    E: SqliteExecutor<'c>,
    O: Send + Unpin,
    (O,): for<'r> FromRow<'r, SqliteRow>,
{
    trace!(sql = statement.sql(), "fetch_scalar");
    Ok(statement.fetch_one(executor).await?)
}
