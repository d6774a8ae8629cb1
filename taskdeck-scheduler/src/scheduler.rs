/// Due-date scheduler loop
///
/// Runs the due-date sweep on a fixed interval until shut down. Errors
/// in one sweep are logged and the loop keeps going; the next tick gets
/// a fresh chance. Transient database failures inside a tick are
/// retried with backoff before counting as a failed sweep.
///
/// # Example
///
/// ```no_run
/// use taskdeck_scheduler::scheduler::DueDateScheduler;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let scheduler = DueDateScheduler::new(pool);
/// let shutdown = scheduler.shutdown_token();
///
/// // e.g. cancel on ctrl-c from another task
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// scheduler.run().await?;
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use sqlx::PgPool;
use taskdeck_shared::db::retry::{with_retry, RetryPolicy};
use taskdeck_shared::notify::scan::run_due_date_scan;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds between sweeps
    pub scan_interval_secs: u64,

    /// Retry policy for transient store failures within a sweep
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            scan_interval_secs: 3600,
            retry: RetryPolicy::default(),
        }
    }
}

/// Periodic due-date sweep runner
pub struct DueDateScheduler {
    db: PgPool,
    config: SchedulerConfig,
    shutdown_token: CancellationToken,
}

impl DueDateScheduler {
    /// Creates a scheduler with the default configuration
    pub fn new(db: PgPool) -> Self {
        Self::with_config(db, SchedulerConfig::default())
    }

    /// Creates a scheduler with a custom configuration
    pub fn with_config(db: PgPool, config: SchedulerConfig) -> Self {
        DueDateScheduler {
            db,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets the shutdown token
    ///
    /// Cancelling it stops the loop after the current sweep.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the sweep loop until shutdown
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            interval_secs = self.config.scan_interval_secs,
            "Due-date scheduler starting"
        );

        loop {
            if self.shutdown_token.is_cancelled() {
                tracing::info!("Due-date scheduler shut down");
                break;
            }

            let today = Utc::now().date_naive();
            let db = self.db.clone();

            let result = with_retry(&self.config.retry, "due_date_scan", || {
                let db = db.clone();
                async move { run_due_date_scan(&db, today).await }
            })
            .await;

            match result {
                Ok(summary) => {
                    tracing::info!(
                        candidates = summary.candidates,
                        notifications_created = summary.notifications_created,
                        "Sweep complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Sweep failed, will retry next tick");
                }
            }

            tokio::select! {
                _ = self.shutdown_token.cancelled() => {}
                _ = sleep(Duration::from_secs(self.config.scan_interval_secs)) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.scan_interval_secs, 3600);
        assert_eq!(config.retry.max_attempts, 3);
    }

    // Sweep behavior against a real database is covered by the shared
    // crate's due_date_scan_tests
}
