/// Bounded retry for transient store failures
///
/// Connection-level failures (socket errors, pool acquire timeouts) are
/// worth a few retries with backoff; logic errors (constraint violations,
/// missing rows) are not. This module provides the classification and a
/// retry combinator applied at the persistence boundary: initial pool
/// connect and scheduler sweeps. After the budget is exhausted the last
/// error is surfaced to the caller as fatal.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy for transient database errors
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Returns true if the error is connection-level and worth retrying
///
/// Constraint violations and row-not-found are deterministic and excluded.
pub fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Runs `op`, retrying transient failures up to the policy's budget
///
/// `label` names the operation in log output. Non-transient errors are
/// returned immediately without consuming the budget.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::db::retry::{with_retry, RetryPolicy};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let count: (i64,) = with_retry(&RetryPolicy::default(), "count_users", || {
///     let pool = pool.clone();
///     async move {
///         sqlx::query_as("SELECT COUNT(*) FROM users")
///             .fetch_one(&pool)
///             .await
///     }
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    op: F,
) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempt < policy.max_attempts => {
                warn!(
                    operation = label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "Transient store error, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_transient_classification() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(is_transient(&io));
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(!is_transient(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };

        let result: Result<u32, _> = with_retry(&policy, "flaky", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        };

        let result: Result<(), _> = with_retry(&policy, "down", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(sqlx::Error::PoolTimedOut) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_fails_immediately() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&RetryPolicy::default(), "missing", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(sqlx::Error::RowNotFound) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
