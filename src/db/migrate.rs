//! Notification schema migration.
//!
//! Reshapes the legacy `notifications` table (one implicit recipient type,
//! keyed by `user_id`) into the role-aware shape via a shadow table:
//!
//! 1. create `notifications_new` in the target shape
//! 2. read every legacy row
//! 3. copy each row, preserving `id`, with `recipient_role = 'customer'`
//! 4. drop the legacy table
//! 5. rename the shadow table to `notifications`
//! 6. build the supporting indexes
//!
//! All six steps run in one transaction on the single connection, so the
//! datastore is either fully migrated or untouched.

use super::executor;
use super::notifications::RecipientRole;
use super::schema::{self, INDEXES, NOTIFICATIONS_TABLE, SHADOW_TABLE};
use super::DbError;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// What a migration run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Legacy rows were copied into the role-aware table.
    Migrated,
    /// The table already had the role-aware shape; only indexes were ensured.
    AlreadyMigrated,
    /// A shadow table was left without a legacy table; it was brought into place.
    Resumed,
}

/// Summary of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    pub rows_copied: usize,
}

/// Shape of the datastore before the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaState {
    Legacy { stale_shadow: bool },
    Migrated,
    Interrupted,
    Empty,
}

/// Row type: (id, user_id, user_type, restaurant_id, booking_id, order_id,
/// title, message, type, is_read, created_at)
type LegacyRow = (
    i64,
    i64,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    String,
    String,
    Option<String>,
    Option<i64>,
    Option<String>,
);

const REQUIRED_LEGACY_COLUMNS: [&str; 4] = ["id", "user_id", "title", "message"];

/// Migrator for the notification table.
pub struct SchemaMigrator<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SchemaMigrator<'a> {
    /// Create a new migrator.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Run the migration. Safe to re-run: a migrated datastore is left as is.
    pub async fn migrate(&self) -> Result<MigrationReport, DbError> {
        let mut tx = self.pool.begin().await?;

        let state = detect_state(&mut *tx).await?;
        info!(?state, "Detected notification schema state");

        let report = match state {
            SchemaState::Legacy { stale_shadow } => {
                let rows_copied = migrate_legacy(&mut *tx, stale_shadow).await?;
                MigrationReport {
                    outcome: MigrationOutcome::Migrated,
                    rows_copied,
                }
            }
            SchemaState::Interrupted => {
                let rows_copied = resume_interrupted(&mut *tx).await?;
                MigrationReport {
                    outcome: MigrationOutcome::Resumed,
                    rows_copied,
                }
            }
            SchemaState::Migrated => MigrationReport {
                outcome: MigrationOutcome::AlreadyMigrated,
                rows_copied: 0,
            },
            SchemaState::Empty => {
                return Err(DbError::Migration(
                    "no notifications table to migrate".to_string(),
                ));
            }
        };

        info!(step = 6, "Creating indexes");
        build_indexes(&mut *tx).await?;

        tx.commit().await?;
        info!(
            outcome = ?report.outcome,
            rows_copied = report.rows_copied,
            "Notification schema migration committed"
        );
        Ok(report)
    }
}

async fn detect_state(conn: &mut SqliteConnection) -> Result<SchemaState, DbError> {
    let columns = schema::table_columns(&mut *conn, NOTIFICATIONS_TABLE).await?;
    let shadow = schema::table_exists(&mut *conn, SHADOW_TABLE).await?;

    let state = if columns.is_empty() {
        if shadow {
            SchemaState::Interrupted
        } else {
            SchemaState::Empty
        }
    } else if columns.iter().any(|c| c == "recipient_role") {
        if shadow {
            warn!(table = SHADOW_TABLE, "Shadow table present next to a migrated table; leaving it");
        }
        SchemaState::Migrated
    } else {
        SchemaState::Legacy {
            stale_shadow: shadow,
        }
    };
    Ok(state)
}

async fn migrate_legacy(conn: &mut SqliteConnection, stale_shadow: bool) -> Result<usize, DbError> {
    let columns = schema::table_columns(&mut *conn, NOTIFICATIONS_TABLE).await?;
    let select = legacy_select(&columns)?;

    info!(step = 1, "Creating shadow table with recipient roles");
    if stale_shadow {
        // The legacy table is the source of truth; a shadow left beside it
        // is an earlier attempt that never completed.
        warn!(table = SHADOW_TABLE, "Discarding stale shadow table");
        executor::execute(&mut *conn, sqlx::query("DROP TABLE notifications_new")).await?;
    }
    schema::create_shadow_table(&mut *conn).await?;

    info!(step = 2, "Reading legacy notifications");
    let legacy_sequence = autoincrement_sequence(conn, NOTIFICATIONS_TABLE).await?;
    let rows: Vec<LegacyRow> = executor::fetch_all(&mut *conn, sqlx::query_as(&select)).await?;
    info!(count = rows.len(), "Found existing notifications to migrate");

    info!(step = 3, "Copying notifications into shadow table");
    for row in &rows {
        copy_row(conn, row).await?;
    }

    let copied: i64 = executor::fetch_scalar(
        &mut *conn,
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications_new"),
    )
    .await?;
    if copied != rows.len() as i64 {
        return Err(DbError::Migration(format!(
            "shadow table holds {copied} rows, expected {}",
            rows.len()
        )));
    }

    if let Some(seq) = legacy_sequence {
        carry_sequence(conn, seq).await?;
    }

    info!(step = 4, "Dropping legacy notifications table");
    executor::execute(&mut *conn, sqlx::query("DROP TABLE notifications")).await?;

    info!(step = 5, "Renaming shadow table to notifications");
    executor::execute(
        &mut *conn,
        sqlx::query("ALTER TABLE notifications_new RENAME TO notifications"),
    )
    .await?;

    Ok(rows.len())
}

/// Build the SELECT over whatever columns the legacy table actually has.
///
/// Only fixed identifiers are interpolated.
fn legacy_select(columns: &[String]) -> Result<String, DbError> {
    let has = |name: &str| columns.iter().any(|c| c == name);

    if let Some(missing) = REQUIRED_LEGACY_COLUMNS.iter().find(|c| !has(**c)) {
        return Err(DbError::Migration(format!(
            "legacy notifications table has no `{missing}` column"
        )));
    }

    let optional = |name: &'static str| {
        if has(name) {
            name.to_string()
        } else {
            format!("NULL AS {name}")
        }
    };
    // `user_type` only exists when an earlier tool already added roles.
    let role = if has("user_type") {
        "user_type".to_string()
    } else {
        "NULL AS user_type".to_string()
    };

    Ok(format!(
        "SELECT id, user_id, {role}, {restaurant}, {booking}, {order}, title, message, {category}, {is_read}, {created_at} \
         FROM notifications ORDER BY id",
        restaurant = optional("restaurant_id"),
        booking = optional("booking_id"),
        order = optional("order_id"),
        category = optional("type"),
        is_read = optional("is_read"),
        created_at = optional("created_at"),
    ))
}

async fn copy_row(conn: &mut SqliteConnection, row: &LegacyRow) -> Result<(), DbError> {
    let (
        id,
        user_id,
        user_type,
        restaurant_id,
        booking_id,
        order_id,
        title,
        message,
        category,
        is_read,
        created_at,
    ) = row;

    let role = match user_type.as_deref() {
        None => RecipientRole::Customer,
        Some(tag) => tag.parse::<RecipientRole>().map_err(|_| {
            DbError::IntegrityViolation(format!(
                "legacy notification {id} has unknown recipient role {tag:?}"
            ))
        })?,
    };

    executor::execute(
        &mut *conn,
        sqlx::query(
            r#"
            INSERT INTO notifications_new
                (id, recipient_id, recipient_role, restaurant_id, booking_id, order_id,
                 title, message, category, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?,
                    COALESCE(?, 'info'), COALESCE(?, 0), COALESCE(?, CURRENT_TIMESTAMP))
            "#,
        )
        .bind(*id)
        .bind(*user_id)
        .bind(role.as_str())
        .bind(*restaurant_id)
        .bind(*booking_id)
        .bind(*order_id)
        .bind(title.as_str())
        .bind(message.as_str())
        .bind(category.as_deref())
        .bind(*is_read)
        .bind(created_at.as_deref()),
    )
    .await?;
    Ok(())
}

async fn autoincrement_sequence(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Option<i64>, DbError> {
    if !schema::table_exists(&mut *conn, "sqlite_sequence").await? {
        return Ok(None);
    }
    let seq: Option<(i64,)> = executor::fetch_optional(
        &mut *conn,
        sqlx::query_as("SELECT seq FROM sqlite_sequence WHERE name = ?").bind(table),
    )
    .await?;
    Ok(seq.map(|(seq,)| seq))
}

/// Keep ids of deleted legacy rows from being handed out again.
async fn carry_sequence(conn: &mut SqliteConnection, seq: i64) -> Result<(), DbError> {
    executor::execute(
        &mut *conn,
        sqlx::query(
            r#"
            INSERT INTO sqlite_sequence (name, seq)
            SELECT ?, ? WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = ?)
            "#,
        )
        .bind(SHADOW_TABLE)
        .bind(seq)
        .bind(SHADOW_TABLE),
    )
    .await?;
    executor::execute(
        &mut *conn,
        sqlx::query("UPDATE sqlite_sequence SET seq = MAX(seq, ?) WHERE name = ?")
            .bind(seq)
            .bind(SHADOW_TABLE),
    )
    .await?;
    Ok(())
}

/// Finish a run that dropped the legacy table but never renamed the shadow.
///
/// A shadow already in the role-aware shape is renamed into place. A shadow
/// still keyed by `user_id` (an earlier tool's intermediate shape) is renamed
/// and then migrated like any legacy table. Returns the number of rows copied.
async fn resume_interrupted(conn: &mut SqliteConnection) -> Result<usize, DbError> {
    let columns = schema::table_columns(&mut *conn, SHADOW_TABLE).await?;

    warn!(
        table = SHADOW_TABLE,
        "Legacy table missing but shadow table present; completing interrupted migration"
    );
    info!(step = 5, "Renaming shadow table to notifications");
    executor::execute(
        &mut *conn,
        sqlx::query("ALTER TABLE notifications_new RENAME TO notifications"),
    )
    .await?;

    if columns.iter().any(|c| c == "recipient_role") {
        return Ok(0);
    }
    migrate_legacy(conn, false).await
}

async fn build_indexes(conn: &mut SqliteConnection) -> Result<(), DbError> {
    for (name, ddl) in INDEXES {
        executor::execute(&mut *conn, sqlx::query(ddl)).await?;
        tracing::debug!(index = name, "Index ensured");
    }
    Ok(())
}
