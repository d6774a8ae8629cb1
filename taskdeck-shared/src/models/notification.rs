/// Notification model and database operations
///
/// Notifications are append-only side effects of task and comment
/// mutations and of the due-date sweep. The only mutation after creation
/// is flipping `is_read`; nothing deletes them, and a deleted task leaves
/// its notifications behind with a nulled task reference.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     task_id UUID REFERENCES tasks(id) ON DELETE SET NULL,
///     kind VARCHAR(20) NOT NULL,
///     message TEXT NOT NULL,
///     is_read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned to the recipient
    Assigned,

    /// Someone commented on a task assigned to the recipient
    Comment,

    /// A task assigned to the recipient is approaching its due date
    DueSoon,
}

impl NotificationKind {
    /// Converts kind to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Assigned => "assigned",
            NotificationKind::Comment => "comment",
            NotificationKind::DueSoon => "due_soon",
        }
    }

    /// Parses a stored string, None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assigned" => Some(NotificationKind::Assigned),
            "comment" => Some(NotificationKind::Comment),
            "due_soon" => Some(NotificationKind::DueSoon),
            _ => None,
        }
    }
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Referenced task; null when none, or when the task was deleted
    pub task_id: Option<Uuid>,

    /// Kind ("assigned", "comment", "due_soon")
    pub kind: String,

    /// Message text, rendered once at creation and never recomputed
    pub message: String,

    /// Read flag
    pub is_read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
///
/// Produced by the rules in [`crate::notify`]; handlers persist it inside
/// the same transaction as the mutation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNotification {
    /// Recipient
    pub user_id: Uuid,

    /// Referenced task
    pub task_id: Option<Uuid>,

    /// Kind
    pub kind: NotificationKind,

    /// Pre-rendered message
    pub message: String,
}

impl Notification {
    /// Creates a new notification
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateNotification,
    ) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, task_id, kind, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, task_id, kind, message, is_read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(data.kind.as_str())
        .bind(data.message)
        .fetch_one(db)
        .await?;

        Ok(notification)
    }

    /// Lists a user's notifications, newest first
    ///
    /// `unread_only` restricts to unread ones. `limit` caps the result; the
    /// API uses 50.
    pub async fn list_for_user<'e>(
        db: impl PgExecutor<'e>,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, task_id, kind, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1
              AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok(notifications)
    }

    /// Counts a user's unread notifications
    pub async fn unread_count<'e>(
        db: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(count)
    }

    /// Marks one notification read
    ///
    /// Scoped to the recipient: someone else's notification id reads as
    /// absent. Returns true if a row was updated.
    pub async fn mark_read<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(db)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks all of a user's notifications read, returning how many flipped
    pub async fn mark_all_read<'e>(
        db: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Checks for a due-soon notification for a task created at/after `since`
    ///
    /// This is the scanner's same-day dedup probe; run it and the insert in
    /// one transaction to close the race between concurrent sweeps.
    pub async fn due_soon_exists_since<'e>(
        db: impl PgExecutor<'e>,
        task_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notifications
                WHERE task_id = $1
                  AND kind = 'due_soon'
                  AND created_at >= $2
            )
            "#,
        )
        .bind(task_id)
        .bind(since)
        .fetch_one(db)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_round_trip() {
        for kind in [
            NotificationKind::Assigned,
            NotificationKind::Comment,
            NotificationKind::DueSoon,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("mention"), None);
    }

    #[test]
    fn test_kind_serde_spelling() {
        let json = serde_json::to_string(&NotificationKind::DueSoon).unwrap();
        assert_eq!(json, "\"due_soon\"");
    }
}
