/// Notification endpoints
///
/// Notifications are scoped to their recipient: listing, counting and
/// read-marking all filter by the authenticated user, and marking
/// another user's notification read reports not-found rather than
/// leaking its existence.
///
/// # Endpoints
///
/// - `GET  /v1/notifications?unread_only=` - List own, newest first
/// - `GET  /v1/notifications/unread-count` - Unread count
/// - `PUT  /v1/notifications/:id/read` - Mark one read
/// - `PUT  /v1/notifications/read-all` - Mark all read
/// - `POST /v1/notifications/check-due-dates` - Trigger a due-date sweep

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::models::notification::Notification;
use taskdeck_shared::notify::scan::{run_due_date_scan, ScanSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Newest notifications returned per request
const LIST_LIMIT: i64 = 50;

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// Unread count response
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Lists the authenticated user's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications =
        Notification::list_for_user(&state.db, auth.user_id, query.unread_only, LIST_LIMIT)
            .await?;

    Ok(Json(notifications))
}

/// Counts the authenticated user's unread notifications
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let count = Notification::unread_count(&state.db, auth.user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Marks one notification read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = Notification::mark_read(&state.db, notification_id, auth.user_id).await?;
    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(json!({ "message": "Notification marked as read" })))
}

/// Marks all of the authenticated user's notifications read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = Notification::mark_all_read(&state.db, auth.user_id).await?;

    Ok(Json(
        json!({ "message": "All notifications marked as read", "updated": updated }),
    ))
}

/// Triggers one due-date sweep with the current date
///
/// Safe to call any number of times per day; alerts already created
/// today are not duplicated. Intended for cron-like callers, and also
/// run periodically by the scheduler daemon.
pub async fn check_due_dates(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<ScanSummary>> {
    let today = Utc::now().date_naive();
    let summary = run_due_date_scan(&state.db, today).await?;

    Ok(Json(summary))
}
