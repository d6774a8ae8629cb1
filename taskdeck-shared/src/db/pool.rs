/// Database connection pool management
///
/// Provides a PostgreSQL connection pool via sqlx with a startup health
/// check. Pool sizing and recycling behavior are configurable so the API
/// server and the scheduler daemon can tune them independently.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let config = DatabaseConfig {
///     url: std::env::var("DATABASE_URL").unwrap(),
///     ..Default::default()
/// };
///
/// let pool = create_pool(config).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use super::retry::{with_retry, RetryPolicy};

/// Configuration for the database connection pool
///
/// Timeouts are in seconds for easy wiring from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections to keep warm
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    pub connect_timeout_seconds: u64,

    /// How long a connection may sit idle before being closed (seconds)
    ///
    /// None = never closed due to idle time
    pub idle_timeout_seconds: Option<u64>,

    /// Maximum lifetime of a connection before recycling (seconds)
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates and initializes a PostgreSQL connection pool
///
/// The initial connection is wrapped in the transient-error retry policy so
/// a briefly unavailable database (e.g. both services starting under
/// docker-compose) does not kill the process.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the database stays unreachable
/// after the retry budget is exhausted.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let pool = with_retry(&RetryPolicy::default(), "connect", || {
        let config = config.clone();
        async move {
            let mut pool_options = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));

            if let Some(idle_timeout) = config.idle_timeout_seconds {
                pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
            }

            if let Some(max_lifetime) = config.max_lifetime_seconds {
                pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
            }

            pool_options.connect(&config.url).await
        }
    })
    .await?;

    health_check(&pool).await?;

    info!("Database connection pool created");
    Ok(pool)
}

/// Performs a health check on the database connection
///
/// # Errors
///
/// Returns an error if the check query fails or returns garbage.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Gracefully closes the connection pool
///
/// Call during shutdown so in-flight queries drain before the process exits.
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
    }

    // Integration tests require a running database and live in tests/
}
