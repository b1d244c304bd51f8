//! Fixture lookup and provisioning for the validation harness.
//!
//! Customers live in `login_users`, restaurant admins in `users`. Both tables
//! belong to other parts of the application; only the columns read here are
//! assumed.

use crate::config::CustomerFixtureConfig;
use crate::db::DbError;
use crate::db::executor;
use sqlx::SqlitePool;

/// Placeholder stored in `password_hash`; the fixture never logs in.
const FIXTURE_PASSWORD_HASH: &str = "hashed";

/// A customer account used as a notification recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerFixture {
    pub id: i64,
    pub email: String,
}

/// A restaurant admin account used as a notification recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminFixture {
    pub id: i64,
    pub email: String,
    pub restaurant_id: Option<i64>,
}

/// Repository for fixture accounts.
pub struct FixtureRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FixtureRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// First customer account, if any.
    pub async fn find_customer(&self) -> Result<Option<CustomerFixture>, DbError> {
        let row: Option<(i64, String)> = executor::fetch_optional(
            self.pool,
            sqlx::query_as(
                "SELECT id, email FROM login_users WHERE role = 'customer' ORDER BY id LIMIT 1",
            ),
        )
        .await?;
        Ok(row.map(|(id, email)| CustomerFixture { id, email }))
    }

    /// Return an existing customer, or insert the configured fixture.
    ///
    /// The boolean is `true` when a row was inserted. Re-running never
    /// inserts a second row for the fixture email.
    pub async fn ensure_customer(
        &self,
        fixture: &CustomerFixtureConfig,
    ) -> Result<(CustomerFixture, bool), DbError> {
        if let Some(customer) = self.find_customer().await? {
            return Ok((customer, false));
        }

        let holder: Option<(i64, Option<String>)> = executor::fetch_optional(
            self.pool,
            sqlx::query_as("SELECT id, role FROM login_users WHERE email = ? LIMIT 1")
                .bind(&fixture.email),
        )
        .await?;
        if let Some((id, role)) = holder {
            return Err(DbError::Validation(format!(
                "fixture email {} already belongs to account {id} with role {}",
                fixture.email,
                role.as_deref().unwrap_or("none")
            )));
        }

        let outcome = executor::execute(
            self.pool,
            sqlx::query(
                r#"
                INSERT INTO login_users (name, email, phone, password_hash, role, is_active)
                VALUES (?, ?, ?, ?, 'customer', 1)
                "#,
            )
            .bind(&fixture.name)
            .bind(&fixture.email)
            .bind(&fixture.phone)
            .bind(FIXTURE_PASSWORD_HASH),
        )
        .await?;

        tracing::info!(id = outcome.last_insert_id, email = %fixture.email, "Created fixture customer");
        Ok((
            CustomerFixture {
                id: outcome.last_insert_id,
                email: fixture.email.clone(),
            },
            true,
        ))
    }

    /// First admin account, if any. The harness never creates one.
    pub async fn find_admin(&self) -> Result<Option<AdminFixture>, DbError> {
        let row: Option<(i64, String, Option<i64>)> = executor::fetch_optional(
            self.pool,
            sqlx::query_as(
                "SELECT id, email, restaurant_id FROM users WHERE role = 'admin' ORDER BY id LIMIT 1",
            ),
        )
        .await?;
        Ok(row.map(|(id, email, restaurant_id)| AdminFixture {
            id,
            email,
            restaurant_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn account_tables() -> Database {
        let db = Database::open_path(":memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE login_users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                phone TEXT,
                password_hash TEXT NOT NULL,
                role TEXT DEFAULT 'customer',
                is_active BOOLEAN DEFAULT 1
            )
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                role TEXT NOT NULL,
                restaurant_id INTEGER
            )
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn ensure_customer_creates_once() {
        let db = account_tables().await;
        let repo = FixtureRepository::new(db.pool());
        let config = CustomerFixtureConfig::default();

        let (first, created) = repo.ensure_customer(&config).await.unwrap();
        assert!(created);
        assert_eq!(first.email, "customer@test.com");

        let (second, created) = repo.ensure_customer(&config).await.unwrap();
        assert!(!created);
        assert_eq!(second, first);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_users WHERE email = ?")
            .bind("customer@test.com")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn ensure_customer_prefers_existing_customer() {
        let db = account_tables().await;
        sqlx::query(
            "INSERT INTO login_users (name, email, password_hash, role) VALUES ('Ana', 'ana@example.com', 'x', 'customer')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let (customer, created) = FixtureRepository::new(db.pool())
            .ensure_customer(&CustomerFixtureConfig::default())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(customer.email, "ana@example.com");
    }

    #[tokio::test]
    async fn ensure_customer_refuses_email_held_by_other_role() {
        let db = account_tables().await;
        sqlx::query(
            "INSERT INTO login_users (name, email, password_hash, role) VALUES ('Ops', 'customer@test.com', 'x', 'staff')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = FixtureRepository::new(db.pool())
            .ensure_customer(&CustomerFixtureConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn find_admin_reads_restaurant() {
        let db = account_tables().await;
        let repo = FixtureRepository::new(db.pool());
        assert!(repo.find_admin().await.unwrap().is_none());

        sqlx::query(
            "INSERT INTO users (email, role, restaurant_id) VALUES ('chef@example.com', 'admin', 3)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let admin = repo.find_admin().await.unwrap().unwrap();
        assert_eq!(admin.email, "chef@example.com");
        assert_eq!(admin.restaurant_id, Some(3));
    }
}
