/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `users`: User listing and profile
/// - `projects`: Project CRUD and project task listing
/// - `tasks`: Task CRUD and search
/// - `comments`: Task comments
/// - `notifications`: Notification listing, read flags, due-date trigger
/// - `events`: SSE live event stream

pub mod auth;
pub mod comments;
pub mod events;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;
