//! Notification table shapes and catalog lookups.

use super::DbError;
use super::executor;
use sqlx::SqliteExecutor;

/// Canonical notification table.
pub const NOTIFICATIONS_TABLE: &str = "notifications";

/// Shadow table that holds the target shape during migration.
pub const SHADOW_TABLE: &str = "notifications_new";

/// Pre-migration shape: a single implicit recipient type keyed by `user_id`.
pub const LEGACY_NOTIFICATIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    restaurant_id INTEGER,
    booking_id INTEGER,
    order_id INTEGER,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    type TEXT DEFAULT 'info',
    is_read BOOLEAN DEFAULT 0,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (restaurant_id) REFERENCES restaurants (id),
    FOREIGN KEY (booking_id) REFERENCES bookings (id),
    FOREIGN KEY (order_id) REFERENCES orders (id)
)
"#;

/// Column list of the role-aware shape.
const TARGET_COLUMNS: &str = r#"
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient_id INTEGER NOT NULL,
    recipient_role TEXT NOT NULL DEFAULT 'customer'
        CHECK (recipient_role IN ('customer', 'admin', 'super_admin')),
    restaurant_id INTEGER,
    booking_id INTEGER,
    order_id INTEGER,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'info',
    is_read BOOLEAN NOT NULL DEFAULT 0,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (restaurant_id) REFERENCES restaurants (id),
    FOREIGN KEY (booking_id) REFERENCES bookings (id),
    FOREIGN KEY (order_id) REFERENCES orders (id)
"#;

fn target_ddl(table: &str) -> String {
    format!("CREATE TABLE IF NOT EXISTS {table} ({TARGET_COLUMNS})")
}

/// Supporting indexes on the canonical table.
pub const INDEXES: [(&str, &str); 3] = [
    (
        "idx_notifications_recipient",
        "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, recipient_role)",
    ),
    (
        "idx_notifications_read",
        "CREATE INDEX IF NOT EXISTS idx_notifications_read ON notifications(is_read)",
    ),
    (
        "idx_notifications_created",
        "CREATE INDEX IF NOT EXISTS idx_notifications_created ON notifications(created_at)",
    ),
];

/// Create the shadow table if it does not exist.
pub async fn create_shadow_table<'c, E>(executor: E) -> Result<(), DbError>
where
    E: SqliteExecutor<'c>,
{
    let ddl = target_ddl(SHADOW_TABLE);
    executor::execute(executor, sqlx::query(&ddl)).await?;
    Ok(())
}

/// Check whether a table exists.
pub async fn table_exists<'c, E>(executor: E, name: &str) -> Result<bool, DbError>
where
    E: SqliteExecutor<'c>,
{
    let found: Option<(i64,)> = executor::fetch_optional(
        executor,
        sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ? LIMIT 1")
            .bind(name),
    )
    .await?;
    Ok(found.is_some())
}

/// Check whether an index exists.
pub async fn index_exists<'c, E>(executor: E, name: &str) -> Result<bool, DbError>
where
    E: SqliteExecutor<'c>,
{
    let found: Option<(i64,)> = executor::fetch_optional(
        executor,
        sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ? LIMIT 1")
            .bind(name),
    )
    .await?;
    Ok(found.is_some())
}

/// Column names of `table`, in declaration order. Empty if the table is absent.
pub async fn table_columns<'c, E>(executor: E, table: &str) -> Result<Vec<String>, DbError>
where
    E: SqliteExecutor<'c>,
{
    let rows: Vec<(String,)> = executor::fetch_all(
        executor,
        sqlx::query_as("SELECT name FROM pragma_table_info(?) ORDER BY cid").bind(table),
    )
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
