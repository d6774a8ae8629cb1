/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdeck_shared::auth::{jwt, middleware::{bearer_token, AuthContext}};
use taskdeck_shared::events::SessionHub;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each request handler via Axum's `State` extractor; the
/// expensive parts are behind Arcs.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Live broadcast hub shared by all sessions
    pub hub: SessionHub,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let hub = SessionHub::new(config.events.buffer_size);
        Self {
            db,
            config: Arc::new(config),
            hub,
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/
///     ├── /auth/                     # register, login, refresh (public)
///     ├── /users                     # list; /me get+update
///     ├── /projects                  # CRUD + /:id/tasks
///     ├── /tasks                     # CRUD + /search + /:id/comments
///     ├── /notifications             # list, unread-count, read, read-all,
///     │                              # check-due-dates trigger
///     └── /events/stream             # SSE live events
/// ```
///
/// Everything under /v1 except /v1/auth requires a Bearer access token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/me",
            get(routes::users::current_user).put(routes::users::update_profile),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:project_id/tasks",
            get(routes::projects::list_project_tasks),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/search", get(routes::tasks::search_tasks))
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/tasks/:task_id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/tasks/:task_id/comments/:comment_id",
            delete(routes::comments::delete_comment),
        )
        .route(
            "/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(routes::notifications::mark_all_read),
        )
        .route(
            "/notifications/:notification_id/read",
            put(routes::notifications::mark_read),
        )
        .route(
            "/notifications/check-due-dates",
            post(routes::notifications::check_due_dates),
        )
        .route("/events/stream", get(routes::events::stream_events))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the Bearer token from the Authorization header and injects
/// an `AuthContext` into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = bearer_token(req.headers())?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut()
        .insert(AuthContext::from_jwt(claims.sub));

    Ok(next.run(req).await)
}
