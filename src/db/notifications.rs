//! Notification repository.
//!
//! Typed create/read access to the canonical `notifications` table. A
//! recipient is always the (role, id) pair; nothing here looks rows up by
//! `recipient_id` alone, since customer, admin and super-admin ids are
//! drawn from independent namespaces.

use super::DbError;
use super::executor;
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

/// Closed set of recipient roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientRole {
    Customer,
    Admin,
    SuperAdmin,
}

impl RecipientRole {
    pub const ALL: [RecipientRole; 3] = [Self::Customer, Self::Admin, Self::SuperAdmin];

    /// Storage tag for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for RecipientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipientRole {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(DbError::IntegrityViolation(format!(
                "unknown recipient role: {other:?}"
            ))),
        }
    }
}

/// The addressee of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    Customer(i64),
    Admin(i64),
    SuperAdmin(i64),
}

impl Recipient {
    pub fn new(role: RecipientRole, id: i64) -> Self {
        match role {
            RecipientRole::Customer => Self::Customer(id),
            RecipientRole::Admin => Self::Admin(id),
            RecipientRole::SuperAdmin => Self::SuperAdmin(id),
        }
    }

    /// Id within the role's namespace.
    pub fn id(self) -> i64 {
        match self {
            Self::Customer(id) | Self::Admin(id) | Self::SuperAdmin(id) => id,
        }
    }

    pub fn role(self) -> RecipientRole {
        match self {
            Self::Customer(_) => RecipientRole::Customer,
            Self::Admin(_) => RecipientRole::Admin,
            Self::SuperAdmin(_) => RecipientRole::SuperAdmin,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role(), self.id())
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotificationCategory {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parse a stored tag. Rows copied from the legacy table may carry tags
    /// outside the set; those read back as `Info`.
    fn from_stored(tag: &str, id: i64) -> Self {
        match tag {
            "info" => Self::Info,
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            other => {
                tracing::warn!(id, category = %other, "Unknown notification category, reading as info");
                Self::Info
            }
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields supplied by the caller when creating a notification.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub recipient: Recipient,
    pub restaurant_id: Option<i64>,
    pub booking_id: Option<i64>,
    pub order_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
}

impl NotificationDraft {
    /// Draft with no external references and the default category.
    pub fn new(recipient: Recipient, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient,
            restaurant_id: None,
            booking_id: None,
            order_id: None,
            title: title.into(),
            message: message.into(),
            category: NotificationCategory::default(),
        }
    }

    pub fn restaurant(mut self, restaurant_id: Option<i64>) -> Self {
        self.restaurant_id = restaurant_id;
        self
    }

    pub fn category(mut self, category: NotificationCategory) -> Self {
        self.category = category;
        self
    }

    fn validate(&self) -> Result<(), DbError> {
        if self.title.trim().is_empty() {
            return Err(DbError::Validation("notification title is required".into()));
        }
        if self.message.trim().is_empty() {
            return Err(DbError::Validation("notification message is required".into()));
        }
        Ok(())
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub recipient: Recipient,
    pub restaurant_id: Option<i64>,
    pub booking_id: Option<i64>,
    pub order_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub is_read: bool,
    /// `YYYY-MM-DD HH:MM:SS` (UTC) for rows written here; legacy rows keep
    /// whatever text they were created with.
    pub created_at: String,
}

/// Row type: (id, recipient_id, recipient_role, restaurant_id, booking_id,
/// order_id, title, message, category, is_read, created_at)
type NotificationRow = (
    i64,
    i64,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    String,
    String,
    String,
    bool,
    String,
);

impl Notification {
    fn from_row(row: NotificationRow) -> Result<Self, DbError> {
        let (
            id,
            recipient_id,
            role,
            restaurant_id,
            booking_id,
            order_id,
            title,
            message,
            category,
            is_read,
            created_at,
        ) = row;
        Ok(Notification {
            id,
            recipient: Recipient::new(role.parse()?, recipient_id),
            restaurant_id,
            booking_id,
            order_id,
            title,
            message,
            category: NotificationCategory::from_stored(&category, id),
            is_read,
            created_at,
        })
    }
}

/// Repository for notification operations.
pub struct NotificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new unread notification and return its id.
    pub async fn create(&self, draft: &NotificationDraft) -> Result<i64, DbError> {
        draft.validate()?;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let outcome = executor::execute(
            self.pool,
            sqlx::query(
                r#"
                INSERT INTO notifications
                    (recipient_id, recipient_role, restaurant_id, booking_id, order_id,
                     title, message, category, is_read, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
                "#,
            )
            .bind(draft.recipient.id())
            .bind(draft.recipient.role().as_str())
            .bind(draft.restaurant_id)
            .bind(draft.booking_id)
            .bind(draft.order_id)
            .bind(&draft.title)
            .bind(&draft.message)
            .bind(draft.category.as_str())
            .bind(&now),
        )
        .await?;

        tracing::debug!(
            id = outcome.last_insert_id,
            recipient = %draft.recipient,
            category = %draft.category,
            "Notification created"
        );
        Ok(outcome.last_insert_id)
    }

    /// Fetch a notification by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, DbError> {
        let row: Option<NotificationRow> = executor::fetch_optional(
            self.pool,
            sqlx::query_as(
                r#"
                SELECT id, recipient_id, recipient_role, restaurant_id, booking_id, order_id,
                       title, message, category, is_read, created_at
                FROM notifications
                WHERE id = ?
                "#,
            )
            .bind(id),
        )
        .await?;

        row.map(Notification::from_row).transpose()
    }

    /// All notifications addressed to `recipient`, newest first.
    pub async fn list_by_recipient(&self, recipient: Recipient) -> Result<Vec<Notification>, DbError> {
        let rows: Vec<NotificationRow> = executor::fetch_all(
            self.pool,
            sqlx::query_as(
                r#"
                SELECT id, recipient_id, recipient_role, restaurant_id, booking_id, order_id,
                       title, message, category, is_read, created_at
                FROM notifications
                WHERE recipient_id = ? AND recipient_role = ?
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .bind(recipient.id())
            .bind(recipient.role().as_str()),
        )
        .await?;

        rows.into_iter().map(Notification::from_row).collect()
    }

    /// Number of unread notifications addressed to `recipient`.
    pub async fn count_unread(&self, recipient: Recipient) -> Result<i64, DbError> {
        executor::fetch_scalar(
            self.pool,
            sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM notifications
                WHERE recipient_id = ? AND recipient_role = ? AND is_read = 0
                "#,
            )
            .bind(recipient.id())
            .bind(recipient.role().as_str()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn migrated_db() -> Database {
        let db = Database::open_path(":memory:").await.unwrap();
        sqlx::query(crate::db::schema::LEGACY_NOTIFICATIONS_DDL)
            .execute(db.pool())
            .await
            .unwrap();
        db.migrator().migrate().await.unwrap();
        db
    }

    #[test]
    fn role_tags_round_trip() {
        for role in RecipientRole::ALL {
            assert_eq!(role.as_str().parse::<RecipientRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_integrity_violation() {
        let err = "superadmin".parse::<RecipientRole>().unwrap_err();
        assert!(matches!(err, DbError::IntegrityViolation(_)));
        assert!("Customer".parse::<RecipientRole>().is_err());
    }

    #[test]
    fn recipient_accessors() {
        let r = Recipient::new(RecipientRole::SuperAdmin, 9);
        assert_eq!(r, Recipient::SuperAdmin(9));
        assert_eq!(r.id(), 9);
        assert_eq!(r.role(), RecipientRole::SuperAdmin);
        assert_eq!(r.to_string(), "super_admin:9");
    }

    #[test]
    fn unknown_stored_category_reads_as_info() {
        assert_eq!(
            NotificationCategory::from_stored("booking", 1),
            NotificationCategory::Info
        );
        assert_eq!(
            NotificationCategory::from_stored("warning", 1),
            NotificationCategory::Warning
        );
    }

    #[tokio::test]
    async fn create_sets_defaults() {
        let db = migrated_db().await;
        let repo = db.notifications();

        let draft = NotificationDraft::new(Recipient::Admin(5), "Admin Alert", "Table 4 waiting")
            .restaurant(Some(3))
            .category(NotificationCategory::Success);
        let id = repo.create(&draft).await.unwrap();

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.recipient, Recipient::Admin(5));
        assert_eq!(stored.restaurant_id, Some(3));
        assert_eq!(stored.booking_id, None);
        assert_eq!(stored.category, NotificationCategory::Success);
        assert!(!stored.is_read);
        assert_eq!(stored.created_at.len(), "YYYY-MM-DD HH:MM:SS".len());
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_message() {
        let db = migrated_db().await;
        let repo = db.notifications();

        let err = repo
            .create(&NotificationDraft::new(Recipient::Customer(1), "  ", "body"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo
            .create(&NotificationDraft::new(Recipient::Customer(1), "title", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.count_unread(Recipient::Customer(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_without_table_is_statement_error() {
        let db = Database::open_path(":memory:").await.unwrap();
        let err = db
            .notifications()
            .create(&NotificationDraft::new(Recipient::Customer(1), "t", "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Statement(_)));
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let db = migrated_db().await;
        let repo = db.notifications();
        let a = repo
            .create(&NotificationDraft::new(Recipient::Customer(1), "a", "a"))
            .await
            .unwrap();
        let b = repo
            .create(&NotificationDraft::new(Recipient::Admin(1), "b", "b"))
            .await
            .unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let db = migrated_db().await;
        sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, recipient_role, title, message, created_at)
            VALUES (2, 'customer', 'old', 'm', '2024-01-01 08:00:00'),
                   (2, 'customer', 'new', 'm', '2024-03-01 08:00:00'),
                   (2, 'customer', 'mid', 'm', '2024-02-01 08:00:00')
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let titles: Vec<String> = db
            .notifications()
            .list_by_recipient(Recipient::Customer(2))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn count_unread_ignores_read_rows() {
        let db = migrated_db().await;
        sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, recipient_role, title, message, is_read)
            VALUES (4, 'admin', 'seen', 'm', 1),
                   (4, 'admin', 'unseen', 'm', 0)
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let repo = db.notifications();
        assert_eq!(repo.list_by_recipient(Recipient::Admin(4)).await.unwrap().len(), 2);
        assert_eq!(repo.count_unread(Recipient::Admin(4)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let db = migrated_db().await;
        assert!(db.notifications().find_by_id(42).await.unwrap().is_none());
    }
}
