/// User listing and profile endpoints
///
/// # Endpoints
///
/// - `GET /v1/users` - List users (for assignee pickers)
/// - `GET /v1/users/me` - Current user
/// - `PUT /v1/users/me` - Update own profile

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::auth::password;
use taskdeck_shared::models::user::{UpdateUser, User};
use serde::Deserialize;
use validator::Validate;

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub skip: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Lists users with pagination
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = User::list(&state.db, query.limit, query.skip).await?;
    Ok(Json(users))
}

/// Returns the authenticated user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates the authenticated user's profile
///
/// # Errors
///
/// - `409 Conflict`: New email already in use by another user
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate().map_err(validation_error)?;

    if let Some(ref email) = req.email {
        if let Some(existing) = User::find_by_email(&state.db, email).await? {
            if existing.id != auth.user_id {
                return Err(ApiError::Conflict(
                    "This email address is already in use".to_string(),
                ));
            }
        }
    }

    let password_hash = match req.password {
        Some(ref password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            avatar: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
