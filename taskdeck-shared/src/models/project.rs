/// Project model and database operations
///
/// Projects are exclusively owned: only the owner may mutate or delete
/// one. Ownership checks belong to the API layer; this module only
/// guarantees that deletion takes the project's tasks and their comments
/// with it, in one transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     color VARCHAR(32) NOT NULL DEFAULT 'aqua',
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Project owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Color tag shown in clients
    pub color: String,

    /// Owning user
    pub owner_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Project title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Color tag; defaults to "aqua" when absent
    pub color: Option<String>,

    /// Owning user
    pub owner_id: Uuid,
}

/// Input for updating a project
///
/// The original full-replace semantics: title, description and color are
/// all written on every update.
#[derive(Debug, Clone)]
pub struct UpdateProject {
    /// New title
    pub title: String,

    /// New description
    pub description: Option<String>,

    /// New color tag
    pub color: Option<String>,
}

impl Project {
    /// Creates a new project
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (title, description, color, owner_id)
            VALUES ($1, $2, COALESCE($3, 'aqua'), $4)
            RETURNING id, title, description, color, owner_id, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.color)
        .bind(data.owner_id)
        .fetch_one(db)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID, None if absent
    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, color, owner_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(project)
    }

    /// Lists projects with pagination, oldest first
    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, color, owner_id, created_at
            FROM projects
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(projects)
    }

    /// Lists projects owned by a user
    pub async fn list_by_owner<'e>(
        db: impl PgExecutor<'e>,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, color, owner_id, created_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(projects)
    }

    /// Updates a project's title, description and color
    ///
    /// Returns the updated project, or None if it doesn't exist.
    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = $2,
                description = $3,
                color = COALESCE($4, color)
            WHERE id = $1
            RETURNING id, title, description, color, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.color)
        .fetch_optional(db)
        .await?;

        Ok(project)
    }

    /// Deletes a project and cascades to its tasks and their comments
    ///
    /// The cascade is explicit: comments of the project's tasks go first,
    /// then the tasks, then the project, all in one transaction.
    /// Notifications referencing the deleted tasks are kept (their task
    /// reference is nulled by the schema).
    ///
    /// Returns true if the project existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM comments
            WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_struct() {
        let create = CreateProject {
            title: "Launch".to_string(),
            description: None,
            color: None,
            owner_id: Uuid::new_v4(),
        };

        assert_eq!(create.title, "Launch");
        assert!(create.color.is_none());
    }

    // Cascade behavior is verified against a real database in the
    // integration suites
}
