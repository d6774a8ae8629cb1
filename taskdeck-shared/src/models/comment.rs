/// Comment model and database operations
///
/// Comments belong to exactly one task and one author. `updated_at` is
/// refreshed by the edit routine; creation sets both timestamps to the
/// same instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Comment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Comment body
    pub content: String,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Author
    pub user_id: Uuid,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// When the comment was last edited
    pub updated_at: DateTime<Utc>,
}

/// Comment joined with its author's public fields, for list responses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub content: String,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Author display name
    pub author_name: String,

    /// Author email
    pub author_email: String,
}

/// Input for creating a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub content: String,
    pub task_id: Uuid,
    pub user_id: Uuid,
}

impl Comment {
    /// Creates a new comment
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateComment,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, task_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, task_id, user_id, created_at, updated_at
            "#,
        )
        .bind(data.content)
        .bind(data.task_id)
        .bind(data.user_id)
        .fetch_one(db)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID within a task, None if absent
    pub async fn find_by_id_and_task<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, task_id, user_id, created_at, updated_at
            FROM comments
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(db)
        .await?;

        Ok(comment)
    }

    /// Lists a task's comments with their authors, newest first
    pub async fn list_by_task<'e>(
        db: impl PgExecutor<'e>,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.content, c.task_id, c.user_id, c.created_at, c.updated_at,
                   u.name AS author_name, u.email AS author_email
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.task_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(db)
        .await?;

        Ok(comments)
    }

    /// Replaces a comment's content, refreshing `updated_at`
    ///
    /// Returns the updated comment, or None if it doesn't exist.
    pub async fn update_content<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, content, task_id, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(db)
        .await?;

        Ok(comment)
    }

    /// Deletes a comment, returning true if it existed
    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
