//! # Worker Runtime
//!
//! The dispatcher owns a fixed pool of worker slots. Each slot loops:
//! dequeue one runnable job, run it to completion, ask for the next. While
//! a job runs, a background task heartbeats its queue row so the reaper can
//! tell live workers from dead ones. A job handler that fails (or a process
//! shutdown mid-job) leaves the row RUNNING on purpose; the reaper times it
//! out and the next generation reschedules it.

pub mod blame;
pub mod staging;

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use rand::Rng;
use sea_orm::DatabaseConnection;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AppConfig;
use crate::error::{Result, SyncError};
use crate::git::GitAdapter;
use crate::models::SYNC_TYPE_GIT_BLAME;
use crate::repositories::{
    CredentialResolver, DequeuedJob, NewSyncLog, QueueRepository, SyncLogRepository,
};

/// Shared handles every job handler needs.
pub struct WorkerContext {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub queue: QueueRepository,
    pub logs: SyncLogRepository,
    pub credentials: CredentialResolver,
    pub git: GitAdapter,
}

/// Dispatcher service owning the worker slots.
pub struct SyncDispatcher {
    ctx: Arc<WorkerContext>,
}

impl SyncDispatcher {
    /// Create a new dispatcher over the shared pool and credential key.
    pub fn new(
        config: Arc<AppConfig>,
        db: DatabaseConnection,
        credentials: CredentialResolver,
    ) -> Self {
        let ctx = WorkerContext {
            queue: QueueRepository::new(db.clone()),
            logs: SyncLogRepository::new(db.clone()),
            credentials,
            git: GitAdapter::new(),
            config,
            db,
        };
        Self { ctx: Arc::new(ctx) }
    }

    /// Run all worker slots until the shutdown token fires. In-flight git
    /// and staging work observes the token; whatever was mid-job rolls
    /// back and is left to the reaper.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let slots = self.ctx.config.worker.concurrency.max(1);
        info!(slots, "Starting sync dispatcher");

        let mut handles = Vec::with_capacity(slots);
        for slot in 0..slots {
            let ctx = Arc::clone(&self.ctx);
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(run_slot(ctx, slot, shutdown)));
        }

        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "worker slot panicked");
            }
        }

        info!("Sync dispatcher stopped");
        Ok(())
    }
}

async fn run_slot(ctx: Arc<WorkerContext>, slot: usize, shutdown: CancellationToken) {
    let poll = Duration::from_millis(ctx.config.worker.poll_interval_ms.max(100));

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match ctx.queue.dequeue().await {
            Ok(Some(job)) => {
                gauge!("sync_jobs_running").increment(1.0);
                let outcome = run_job(&ctx, &job, &shutdown).await;
                gauge!("sync_jobs_running").decrement(1.0);

                if let Err(err) = outcome {
                    if matches!(err, SyncError::Cancelled) {
                        info!(queue_id = job.id, "job cancelled by shutdown");
                        break;
                    }
                    counter!("sync_jobs_failed_total").increment(1);
                    error!(
                        queue_id = job.id,
                        sync_type = %job.sync_type,
                        repo = %job.repo,
                        error = %err,
                        "sync job failed"
                    );
                    // The row stays RUNNING; the reaper will time it out.
                    ctx.logs
                        .append_best_effort(vec![NewSyncLog::error(
                            job.id,
                            format!("sync failed: {}", err),
                        )])
                        .await;
                }
            }
            Ok(None) => {
                debug!(slot, "no runnable job");
                idle(&poll, &shutdown).await;
            }
            Err(err) => {
                error!(slot, error = %err, "dequeue failed");
                idle(&poll, &shutdown).await;
            }
        }
    }
}

/// Sleep one poll interval with a little jitter so the slots do not hammer
/// the queue in lockstep.
async fn idle(poll: &Duration, shutdown: &CancellationToken) {
    let jitter_ms = rand::thread_rng().gen_range(0..=poll.as_millis().max(1) as u64 / 10);
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = sleep(*poll + Duration::from_millis(jitter_ms)) => {}
    }
}

#[instrument(skip(ctx, shutdown), fields(queue_id = job.id, sync_type = %job.sync_type, repo = %job.repo))]
async fn run_job(
    ctx: &Arc<WorkerContext>,
    job: &DequeuedJob,
    shutdown: &CancellationToken,
) -> Result<()> {
    let started = Instant::now();
    info!("starting sync job");
    counter!("sync_jobs_started_total", "sync_type" => job.sync_type.clone()).increment(1);

    ctx.logs
        .append_best_effort(vec![NewSyncLog::info(
            job.id,
            format!("starting sync {} for {}", job.sync_type, job.repo),
        )])
        .await;

    let heartbeat = spawn_keep_alive(ctx, job.id, shutdown);

    let result = match job.sync_type.as_str() {
        SYNC_TYPE_GIT_BLAME => blame::sync_git_blame(ctx, job, shutdown).await,
        other => {
            warn!(sync_type = other, "no worker registered for sync type");
            ctx.logs
                .append_best_effort(vec![NewSyncLog::warn(
                    job.id,
                    format!("no worker registered for sync type {}", other),
                )])
                .await;
            Ok(())
        }
    };

    heartbeat.stop().await;

    let elapsed = started.elapsed();
    histogram!("sync_job_duration_seconds", "sync_type" => job.sync_type.clone())
        .record(elapsed.as_secs_f64());

    if result.is_ok() {
        info!(elapsed_seconds = elapsed.as_secs_f64(), "sync job finished");
    }

    result
}

struct KeepAliveHandle {
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl KeepAliveHandle {
    async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

/// Heartbeat the queue row every keep_alive_seconds until the job ends or
/// the process shuts down. The cadence must stay well under the reaper
/// timeout.
fn spawn_keep_alive(
    ctx: &Arc<WorkerContext>,
    queue_id: i64,
    shutdown: &CancellationToken,
) -> KeepAliveHandle {
    let token = shutdown.child_token();
    let task_token = token.clone();
    let queue = ctx.queue.clone();
    let interval = Duration::from_secs(ctx.config.worker.keep_alive_seconds.max(1));

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = task_token.cancelled() => break,
                _ = sleep(interval) => {
                    if let Err(err) = queue.set_keep_alive(queue_id).await {
                        warn!(queue_id, error = %err, "keep-alive update failed");
                    }
                }
            }
        }
    });

    KeepAliveHandle { token, handle }
}
