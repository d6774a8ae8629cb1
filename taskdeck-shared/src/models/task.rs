/// Task model and database operations
///
/// Tasks are the central entity of the tracker. A task may float free of
/// any project (`project_id` nullable) and may be unassigned; its status
/// and priority are stored as plain strings with typed helpers below.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status VARCHAR(20) NOT NULL DEFAULT 'todo',
///     priority VARCHAR(10) NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     start_time VARCHAR(16),
///     end_time VARCHAR(16),
///     assignee_id UUID REFERENCES users(id),
///     project_id UUID REFERENCES projects(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task::{CreateTask, Task, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, me: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Write release notes".to_string(),
///     assignee_id: Some(me),
///     ..Default::default()
/// }).await?;
///
/// assert_eq!(task.status, TaskStatus::Todo.as_str());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Task workflow status
///
/// The wire spelling of `InProgress` is `inProgress`, kept for
/// compatibility with existing clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Awaiting review
    Review,

    /// Finished; done tasks are excluded from due-date alerts
    Done,
}

impl TaskStatus {
    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Parses a stored or wire string, None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "inProgress" => Some(TaskStatus::InProgress),
            "review" => Some(TaskStatus::Review),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Converts priority to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Parses a stored or wire string, None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status ("todo", "inProgress", "review", "done")
    pub status: String,

    /// Priority ("low", "medium", "high")
    pub priority: String,

    /// Calendar due date, no time zone attached
    pub due_date: Option<NaiveDate>,

    /// Optional opaque start time string (e.g. "09:00")
    pub start_time: Option<String>,

    /// Optional opaque end time string
    pub end_time: Option<String>,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    /// Parent project, if any
    pub project_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Status; defaults to "todo" when absent
    pub status: Option<TaskStatus>,

    /// Priority; defaults to "medium" when absent
    pub priority: Option<TaskPriority>,

    /// Due date
    pub due_date: Option<NaiveDate>,

    /// Start time string
    pub start_time: Option<String>,

    /// End time string
    pub end_time: Option<String>,

    /// Assignee
    pub assignee_id: Option<Uuid>,

    /// Parent project
    pub project_id: Option<Uuid>,
}

/// Input for updating a task
///
/// Absent fields are left unchanged; a field cannot be cleared through
/// this struct.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date
    pub due_date: Option<NaiveDate>,

    /// New start time
    pub start_time: Option<String>,

    /// New end time
    pub end_time: Option<String>,

    /// New assignee
    pub assignee_id: Option<Uuid>,

    /// New parent project
    pub project_id: Option<Uuid>,
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Fails with a foreign-key violation if the assignee or project does
    /// not exist.
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date,
                               start_time, end_time, assignee_id, project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, title, description, status, priority, due_date,
                      start_time, end_time, assignee_id, project_id, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.unwrap_or(TaskStatus::Todo).as_str())
        .bind(data.priority.unwrap_or(TaskPriority::Medium).as_str())
        .bind(data.due_date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.assignee_id)
        .bind(data.project_id)
        .fetch_one(db)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, None if absent
    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   start_time, end_time, assignee_id, project_id, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(task)
    }

    /// Lists tasks with pagination, oldest first
    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   start_time, end_time, assignee_id, project_id, created_at
            FROM tasks
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks assigned to a user, oldest first
    pub async fn list_by_assignee<'e>(
        db: impl PgExecutor<'e>,
        assignee_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   start_time, end_time, assignee_id, project_id, created_at
            FROM tasks
            WHERE assignee_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(assignee_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(tasks)
    }

    /// Lists all tasks in a project, in insertion order
    pub async fn list_by_project<'e>(
        db: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   start_time, end_time, assignee_id, project_id, created_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(db)
        .await?;

        Ok(tasks)
    }

    /// Free-text search across title and description
    pub async fn search<'e>(
        db: impl PgExecutor<'e>,
        query: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = format!("%{}%", query);

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   start_time, end_time, assignee_id, project_id, created_at
            FROM tasks
            WHERE title ILIKE $1 OR description ILIKE $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(db)
        .await?;

        Ok(tasks)
    }

    /// Lists due-date-scan candidates for a target date
    ///
    /// A candidate is due exactly on `date`, not done, and assigned.
    pub async fn list_due_on<'e>(
        db: impl PgExecutor<'e>,
        date: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   start_time, end_time, assignee_id, project_id, created_at
            FROM tasks
            WHERE due_date = $1
              AND status <> 'done'
              AND assignee_id IS NOT NULL
            "#,
        )
        .bind(date)
        .fetch_all(db)
        .await?;

        Ok(tasks)
    }

    /// Updates a task
    ///
    /// Only fields present in `data` are written. Returns the updated
    /// task, or None if it doesn't exist.
    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the UPDATE dynamically from the fields that are present
        let mut query = String::from("UPDATE tasks SET id = id");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.start_time.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_time = ${}", bind_count));
        }
        if data.end_time.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_time = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }
        if data.project_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", project_id = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, due_date, \
             start_time, end_time, assignee_id, project_id, created_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(start_time) = data.start_time {
            q = q.bind(start_time);
        }
        if let Some(end_time) = data.end_time {
            q = q.bind(end_time);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(project_id) = data.project_id {
            q = q.bind(project_id);
        }

        let task = q.fetch_optional(db).await?;

        Ok(task)
    }

    /// Deletes a task and cascades to its comments
    ///
    /// Comments go first, then the task, in one transaction. Notifications
    /// referencing the task are kept (the schema nulls their reference).
    ///
    /// Returns true if the task existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
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
    fn test_task_status_round_trip() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Done,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("blocked"), None);
    }

    #[test]
    fn test_task_status_wire_spelling() {
        assert_eq!(TaskStatus::InProgress.as_str(), "inProgress");
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"inProgress\"");
    }

    #[test]
    fn test_task_priority_round_trip() {
        for priority in [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High] {
            assert_eq!(TaskPriority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn test_create_task_defaults() {
        let create = CreateTask {
            title: "t".to_string(),
            ..Default::default()
        };
        assert!(create.status.is_none());
        assert!(create.priority.is_none());
        assert!(create.assignee_id.is_none());
    }
}
