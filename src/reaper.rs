//! # Reaper
//!
//! Background task that times out abandoned jobs. A RUNNING row whose
//! heartbeat (or, failing that, start time) is older than the configured
//! threshold moves to DONE with an ERROR log line. That unblocks the
//! group's generation barrier so the binding reschedules next batch.

use std::sync::Arc;

use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::repositories::QueueRepository;

/// Background reaper service.
pub struct Reaper {
    config: Arc<AppConfig>,
    queue: QueueRepository,
}

impl Reaper {
    /// Create a new reaper instance.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        Self {
            config,
            queue: QueueRepository::new(db),
        }
    }

    /// Run the reaper loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!("Starting reaper");
        let tick_interval = TokioDuration::from_secs(self.config.reaper.tick_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Reaper shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Reaper tick failed");
                    }
                    let elapsed = tick_started.elapsed();
                    histogram!("reaper_tick_duration_ms")
                        .record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Reaper stopped");
        Ok(())
    }

    /// Execute one tick: time out every stale RUNNING row.
    pub async fn tick(&self) -> Result<()> {
        let reaped = self
            .queue
            .mark_timed_out(self.config.reaper.timeout_minutes)
            .await?;

        counter!("reaper_jobs_timed_out_total").increment(reaped.len() as u64);

        if reaped.is_empty() {
            debug!("No stale jobs to reap");
        } else {
            warn!(queue_ids = ?reaped, "Timed out unresponsive sync jobs");
        }

        Ok(())
    }
}
