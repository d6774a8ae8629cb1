/// Project endpoints
///
/// Projects are exclusively owned: any mutation by a non-owner fails with
/// 403 before anything is written or broadcast. Deleting a project takes
/// its tasks and their comments with it in one transaction, then emits a
/// single `project_deleted` event.
///
/// # Endpoints
///
/// - `GET    /v1/projects` - List projects
/// - `POST   /v1/projects` - Create project
/// - `GET    /v1/projects/:id` - Project detail
/// - `PUT    /v1/projects/:id` - Update (owner only)
/// - `DELETE /v1/projects/:id` - Delete (owner only)
/// - `GET    /v1/projects/:id/tasks` - Tasks in the project

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::events::{BroadcastEvent, EventKind};
use taskdeck_shared::models::project::{CreateProject, Project, UpdateProject};
use taskdeck_shared::models::task::Task;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub skip: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Restrict to projects owned by the authenticated user
    #[serde(default)]
    pub mine: bool,
}

fn default_limit() -> i64 {
    100
}

/// Create/update payload; update replaces title, description and color
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectPayload {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub color: Option<String>,
}

fn project_event(kind: EventKind, project: &Project) -> BroadcastEvent {
    BroadcastEvent::new(
        kind,
        json!({
            "id": project.id,
            "title": project.title,
            "description": project.description,
            "color": project.color,
            "owner_id": project.owner_id,
        }),
    )
}

/// Lists projects with pagination (`mine=true` filters to own)
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = if query.mine {
        Project::list_by_owner(&state.db, auth.user_id, query.limit, query.skip).await?
    } else {
        Project::list(&state.db, query.limit, query.skip).await?
    };

    Ok(Json(projects))
}

/// Creates a project owned by the authenticated user
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProjectPayload>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(validation_error)?;

    let project = Project::create(
        &state.db,
        CreateProject {
            title: req.title,
            description: req.description,
            color: req.color,
            owner_id: auth.user_id,
        },
    )
    .await?;

    state
        .hub
        .publish(project_event(EventKind::ProjectCreated, &project));

    Ok(Json(project))
}

/// Returns a project by ID
pub async fn get_project(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Updates a project (owner only)
///
/// # Errors
///
/// - `403 Forbidden`: Actor is not the owner; nothing is written or
///   broadcast
/// - `404 Not Found`: No such project
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ProjectPayload>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(validation_error)?;

    let existing = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if existing.owner_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You don't have permission to update this project".to_string(),
        ));
    }

    let project = Project::update(
        &state.db,
        project_id,
        UpdateProject {
            title: req.title,
            description: req.description,
            color: req.color,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    state
        .hub
        .publish(project_event(EventKind::ProjectUpdated, &project));

    Ok(Json(project))
}

/// Deletes a project and its tasks (owner only)
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let existing = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if existing.owner_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this project".to_string(),
        ));
    }

    Project::delete(&state.db, project_id).await?;

    tracing::info!(project_id = %project_id, "Project deleted");

    state.hub.publish(BroadcastEvent::new(
        EventKind::ProjectDeleted,
        json!({ "id": project_id }),
    ));

    Ok(Json(json!({ "message": "Project deleted" })))
}

/// Lists the tasks in a project, in insertion order
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_project(&state.db, project_id).await?;
    Ok(Json(tasks))
}
