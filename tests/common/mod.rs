//! Integration test common infrastructure.
//!
//! Provides datastore builders for the legacy and migrated notification
//! shapes plus the account tables the validation harness reads.

#![allow(dead_code)]

use restodb_notify::Database;
use restodb_notify::config::DatabaseConfig;
use restodb_notify::db::schema::LEGACY_NOTIFICATIONS_DDL;
use std::path::Path;

/// A legacy-shaped notification row.
pub struct LegacyNotification<'a> {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: Option<i64>,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: &'a str,
    pub is_read: bool,
    pub created_at: &'a str,
}

/// In-memory datastore holding an empty legacy notifications table.
pub async fn legacy_db() -> Database {
    let db = Database::open_path(":memory:").await.expect("open memory db");
    sqlx::query(LEGACY_NOTIFICATIONS_DDL)
        .execute(db.pool())
        .await
        .expect("create legacy table");
    db
}

/// File-backed datastore at `dir/database/restaurant.db`.
pub async fn file_db(dir: &Path) -> (Database, DatabaseConfig) {
    let config = DatabaseConfig {
        path: dir
            .join("database")
            .join("restaurant.db")
            .display()
            .to_string(),
        create_if_missing: true,
        integrity_check: true,
    };
    let db = Database::open(&config).await.expect("open file db");
    (db, config)
}

pub async fn insert_legacy(db: &Database, row: &LegacyNotification<'_>) {
    sqlx::query(
        r#"
        INSERT INTO notifications
            (id, user_id, restaurant_id, title, message, type, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(row.restaurant_id)
    .bind(row.title)
    .bind(row.message)
    .bind(row.kind)
    .bind(row.is_read)
    .bind(row.created_at)
    .execute(db.pool())
    .await
    .expect("insert legacy row");
}

/// Create `login_users` (customers) and `users` (restaurant staff).
pub async fn create_account_tables(db: &Database) {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            phone TEXT,
            password_hash TEXT NOT NULL,
            role TEXT DEFAULT 'customer',
            is_active BOOLEAN DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(db.pool())
    .await
    .expect("create login_users");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT,
            role TEXT NOT NULL DEFAULT 'admin',
            restaurant_id INTEGER
        )
        "#,
    )
    .execute(db.pool())
    .await
    .expect("create users");
}

pub async fn insert_admin(db: &Database, email: &str, restaurant_id: i64) -> i64 {
    sqlx::query(
        "INSERT INTO users (name, email, role, restaurant_id) VALUES ('Admin', ?, 'admin', ?)",
    )
    .bind(email)
    .bind(restaurant_id)
    .execute(db.pool())
    .await
    .expect("insert admin")
    .last_insert_rowid()
}

pub async fn count(db: &Database, sql: &str) -> i64 {
    sqlx::query_scalar(sql)
        .fetch_one(db.pool())
        .await
        .expect("count query")
}
