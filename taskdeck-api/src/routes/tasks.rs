/// Task endpoints
///
/// Task mutation is the main notification trigger: an update that hands
/// the task to a new assignee writes the `assigned` notification inside
/// the same transaction as the task row, then broadcasts `task_updated`
/// once the transaction has committed.
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List tasks (`my_tasks=true` filters to own)
/// - `GET    /v1/tasks/search?q=` - Free-text search
/// - `POST   /v1/tasks` - Create task
/// - `GET    /v1/tasks/:id` - Task detail
/// - `PUT    /v1/tasks/:id` - Update task
/// - `DELETE /v1/tasks/:id` - Delete task and its comments

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::events::{BroadcastEvent, EventKind};
use taskdeck_shared::models::notification::Notification;
use taskdeck_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
use taskdeck_shared::models::user::User;
use taskdeck_shared::notify;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Task list query parameters
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub skip: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Restrict to tasks assigned to the authenticated user
    #[serde(default)]
    pub my_tasks: bool,
}

fn default_limit() -> i64 {
    100
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchTasksQuery {
    pub q: String,
}

/// Create payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// "todo", "inProgress", "review" or "done"; defaults to "todo"
    pub status: Option<String>,

    /// "low", "medium" or "high"; defaults to "medium"
    pub priority: Option<String>,

    pub due_date: Option<NaiveDate>,

    pub start_time: Option<String>,

    pub end_time: Option<String>,

    /// Defaults to the creating user when absent
    pub assignee_id: Option<Uuid>,

    pub project_id: Option<Uuid>,
}

/// Update payload; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,

    pub priority: Option<String>,

    pub due_date: Option<NaiveDate>,

    pub start_time: Option<String>,

    pub end_time: Option<String>,

    pub assignee_id: Option<Uuid>,

    pub project_id: Option<Uuid>,
}

fn parse_status(s: &str) -> Result<TaskStatus, ApiError> {
    TaskStatus::parse(s).ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", s)))
}

fn parse_priority(s: &str) -> Result<TaskPriority, ApiError> {
    TaskPriority::parse(s).ok_or_else(|| ApiError::BadRequest(format!("Unknown priority: {}", s)))
}

fn task_event(kind: EventKind, task: &Task) -> BroadcastEvent {
    BroadcastEvent::new(
        kind,
        json!({
            "id": task.id,
            "title": task.title,
            "description": task.description,
            "status": task.status,
            "priority": task.priority,
            "due_date": task.due_date,
            "start_time": task.start_time,
            "end_time": task.end_time,
            "assignee_id": task.assignee_id,
            "project_id": task.project_id,
            "created_at": task.created_at.to_rfc3339(),
        }),
    )
}

/// Lists tasks with pagination
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = if query.my_tasks {
        Task::list_by_assignee(&state.db, auth.user_id, query.limit, query.skip).await?
    } else {
        Task::list(&state.db, query.limit, query.skip).await?
    };

    Ok(Json(tasks))
}

/// Free-text search across title and description
pub async fn search_tasks(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<SearchTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::search(&state.db, &query.q).await?;
    Ok(Json(tasks))
}

/// Creates a task
///
/// An unset assignee defaults to the creating user.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(validation_error)?;

    let status = req.status.as_deref().map(parse_status).transpose()?;
    let priority = req.priority.as_deref().map(parse_priority).transpose()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status,
            priority,
            due_date: req.due_date,
            start_time: req.start_time,
            end_time: req.end_time,
            assignee_id: req.assignee_id.or(Some(auth.user_id)),
            project_id: req.project_id,
        },
    )
    .await?;

    state.hub.publish(task_event(EventKind::TaskCreated, &task));

    Ok(Json(task))
}

/// Returns a task by ID
pub async fn get_task(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Updates a task
///
/// The task row and any `assigned` notification commit atomically; the
/// `task_updated` broadcast goes out only after the commit.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(validation_error)?;

    let status = req.status.as_deref().map(parse_status).transpose()?;
    let priority = req.priority.as_deref().map(parse_priority).transpose()?;

    let mut tx = state.db.begin().await?;

    let existing = Task::find_by_id(&mut *tx, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    let old_assignee_id = existing.assignee_id;

    let task = Task::update(
        &mut *tx,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status,
            priority,
            due_date: req.due_date,
            start_time: req.start_time,
            end_time: req.end_time,
            assignee_id: req.assignee_id,
            project_id: req.project_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let actor = User::find_by_id(&mut *tx, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if let Some(data) = notify::on_task_assigned(&task, old_assignee_id, task.assignee_id, &actor)
    {
        Notification::create(&mut *tx, data).await?;
        tracing::info!(
            task_id = %task.id,
            assignee_id = ?task.assignee_id,
            "Assignment notification created"
        );
    }

    tx.commit().await?;

    state.hub.publish(task_event(EventKind::TaskUpdated, &task));

    Ok(Json(task))
}

/// Deletes a task and its comments
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = Task::delete(&state.db, task_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task_id, "Task deleted");

    state.hub.publish(BroadcastEvent::new(
        EventKind::TaskDeleted,
        json!({ "id": task_id }),
    ));

    Ok(Json(json!({ "message": "Task deleted" })))
}
