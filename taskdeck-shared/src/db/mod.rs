/// Database access layer
///
/// - `pool`: PostgreSQL connection pool construction and health checks
/// - `migrations`: sqlx migration runner
/// - `retry`: bounded retry with backoff for transient connection failures

pub mod migrations;
pub mod pool;
pub mod retry;
