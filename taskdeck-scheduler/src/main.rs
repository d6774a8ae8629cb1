//! # Taskdeck Scheduler
//!
//! Standalone daemon that periodically triggers the due-date sweep.
//! Deploy one instance alongside the API server; running extra
//! instances is safe because the sweep deduplicates per day.
//!
//! ## Environment
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `SCAN_INTERVAL_SECS`: Seconds between sweeps (default: 3600)
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskdeck-scheduler
//! ```

use taskdeck_scheduler::scheduler::{DueDateScheduler, SchedulerConfig};
use taskdeck_shared::db::migrations::run_migrations;
use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
use taskdeck_shared::db::retry::RetryPolicy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_scheduler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskdeck Scheduler v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    let scan_interval_secs = std::env::var("SCAN_INTERVAL_SECS")
        .unwrap_or_else(|_| "3600".to_string())
        .parse::<u64>()?;

    let pool = create_pool(DatabaseConfig {
        url: database_url,
        max_connections: 2,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let scheduler = DueDateScheduler::with_config(
        pool,
        SchedulerConfig {
            scan_interval_secs,
            retry: RetryPolicy::default(),
        },
    );

    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    scheduler.run().await
}
