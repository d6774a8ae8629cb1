/// Due-date sweep
///
/// A stateless pass over the task table: for each threshold in
/// {3, 1, 0} days it collects the tasks due exactly that far from
/// `today` (excluding done and unassigned tasks) and creates a
/// `due_soon` notification for each, unless one was already created
/// today for that task.
///
/// The sweep is re-entrant and safe to run concurrently with itself:
/// the dedup probe and the insert for a candidate task share one
/// transaction, so two overlapping sweeps cannot both insert for the
/// same task on the same day. `today` is an explicit parameter so
/// tests can pin the clock; production callers pass
/// `Utc::now().date_naive()`.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::notify::scan::run_due_date_scan;
/// use chrono::Utc;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let summary = run_due_date_scan(&pool, Utc::now().date_naive()).await?;
/// println!("created {} alerts", summary.notifications_created);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::models::notification::Notification;
use crate::models::task::Task;

/// Days-before-due thresholds that produce an alert
pub const DUE_THRESHOLDS: [i64; 3] = [3, 1, 0];

/// Result of one due-date sweep
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// The due dates that were checked (today + each threshold)
    pub checked_dates: Vec<NaiveDate>,

    /// How many tasks matched a threshold
    pub candidates: usize,

    /// How many new notifications were created (candidates minus the
    /// ones already alerted today)
    pub notifications_created: u64,
}

/// Runs one due-date sweep for the given calendar day
///
/// # Errors
///
/// Returns the first database error encountered; candidates already
/// processed keep their notifications (each candidate commits its own
/// transaction).
pub async fn run_due_date_scan(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<ScanSummary, sqlx::Error> {
    // Dedup window: anything created since today's midnight UTC counts
    let since = today.and_time(NaiveTime::MIN).and_utc();

    let mut candidates = 0;
    let mut created = 0u64;

    for days_before in DUE_THRESHOLDS {
        let target = today + Duration::days(days_before);
        let tasks = Task::list_due_on(pool, target).await?;
        candidates += tasks.len();

        for task in tasks {
            let mut tx = pool.begin().await?;

            let already_alerted =
                Notification::due_soon_exists_since(&mut *tx, task.id, since).await?;

            if already_alerted {
                debug!(task_id = %task.id, "Due-soon alert already created today");
            } else if let Some(data) = super::on_due_soon(&task, days_before) {
                Notification::create(&mut *tx, data).await?;
                created += 1;
            }

            tx.commit().await?;
        }
    }

    let checked_dates: Vec<NaiveDate> = DUE_THRESHOLDS
        .iter()
        .map(|d| today + Duration::days(*d))
        .collect();

    info!(
        candidates,
        notifications_created = created,
        "Due-date sweep finished"
    );

    Ok(ScanSummary {
        checked_dates,
        candidates,
        notifications_created: created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(DUE_THRESHOLDS, [3, 1, 0]);
    }

    #[test]
    fn test_checked_dates_cover_thresholds() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let dates: Vec<NaiveDate> = DUE_THRESHOLDS
            .iter()
            .map(|d| today + Duration::days(*d))
            .collect();

        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 1, 18).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
        assert_eq!(dates[2], today);
    }

    // Idempotence against a real database is covered in
    // tests/due_date_scan_tests.rs
}
