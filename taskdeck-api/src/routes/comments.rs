/// Comment endpoints
///
/// Creating a comment on a task assigned to someone else writes the
/// `comment` notification in the same transaction as the comment row.
/// Only a comment's author may delete it.
///
/// # Endpoints
///
/// - `GET    /v1/tasks/:task_id/comments` - List comments, newest first
/// - `POST   /v1/tasks/:task_id/comments` - Create comment
/// - `DELETE /v1/tasks/:task_id/comments/:comment_id` - Delete (author only)

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::events::{BroadcastEvent, EventKind};
use taskdeck_shared::models::comment::{Comment, CommentWithAuthor, CreateComment};
use taskdeck_shared::models::notification::Notification;
use taskdeck_shared::models::task::Task;
use taskdeck_shared::models::user::User;
use taskdeck_shared::notify;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Create payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub content: String,
}

/// Lists a task's comments with author details, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    let comments = Comment::list_by_task(&state.db, task_id).await?;
    Ok(Json(comments))
}

/// Creates a comment on a task
///
/// # Errors
///
/// - `404 Not Found`: No such task
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate().map_err(validation_error)?;

    let mut tx = state.db.begin().await?;

    let task = Task::find_by_id(&mut *tx, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let author = User::find_by_id(&mut *tx, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    let comment = Comment::create(
        &mut *tx,
        CreateComment {
            content: req.content,
            task_id,
            user_id: author.id,
        },
    )
    .await?;

    if let Some(data) = notify::on_comment_created(&task, &comment.content, &author) {
        Notification::create(&mut *tx, data).await?;
    }

    tx.commit().await?;

    state.hub.publish(BroadcastEvent::new(
        EventKind::CommentCreated,
        json!({
            "id": comment.id,
            "content": comment.content,
            "task_id": task_id,
            "user_id": author.id,
            "user": {
                "id": author.id,
                "name": author.name,
                "email": author.email,
            },
            "created_at": comment.created_at.to_rfc3339(),
        }),
    ));

    Ok(Json(comment))
}

/// Deletes a comment (author only)
///
/// # Errors
///
/// - `403 Forbidden`: Actor is not the comment's author
/// - `404 Not Found`: No such comment on this task
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let comment = Comment::find_by_id_and_task(&state.db, comment_id, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this comment".to_string(),
        ));
    }

    Comment::delete(&state.db, comment_id).await?;

    state.hub.publish(BroadcastEvent::new(
        EventKind::CommentDeleted,
        json!({ "id": comment_id, "task_id": task_id }),
    ));

    Ok(Json(json!({ "message": "Comment deleted" })))
}
