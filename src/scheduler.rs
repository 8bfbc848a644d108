//! # Sync Scheduler
//!
//! Background task that enqueues every due repo sync on each tick. The
//! insert respects at-most-one-live per binding and the per-group
//! generation barrier, and runs as one atomic statement, so multiple
//! scheduler instances may coordinate safely through the store alone.

use std::sync::Arc;

use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::AppConfig;
use crate::error::Result;
use crate::repositories::QueueRepository;

/// Background scheduler service.
pub struct SyncScheduler {
    config: Arc<AppConfig>,
    queue: QueueRepository,
}

impl SyncScheduler {
    /// Create a new scheduler instance.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        Self {
            config,
            queue: QueueRepository::new(db),
        }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!("Starting sync scheduler");
        let tick_interval = TokioDuration::from_secs(self.config.scheduler.tick_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sync scheduler shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Scheduler tick failed");
                    }
                    let elapsed = tick_started.elapsed();
                    histogram!("sync_scheduler_tick_duration_ms")
                        .record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// Execute one tick: insert a QUEUED row for every eligible binding.
    pub async fn tick(&self) -> Result<()> {
        let enqueued = self.queue.enqueue_all_due().await?;

        counter!("sync_scheduler_jobs_enqueued_total").increment(enqueued);

        if enqueued > 0 {
            info!(enqueued, "Enqueued due repo syncs");
        } else {
            debug!("No repo syncs due this tick");
        }

        Ok(())
    }
}
