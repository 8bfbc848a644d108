//! # Sync Log Repository
//!
//! Batched insertion of per-job log lines. Log writes are best-effort with
//! respect to result transactions: they run on the shared pool, never
//! inside a worker's publish transaction, so a log failure cannot roll back
//! result data.

use sea_orm::{ActiveValue::NotSet, DatabaseConnection, EntityTrait, Set};
use tracing::warn;

use crate::error::Result;
use crate::models::sync_log;

/// One log line waiting to be flushed.
#[derive(Debug, Clone)]
pub struct NewSyncLog {
    pub queue_id: i64,
    pub log_type: &'static str,
    pub message: String,
}

impl NewSyncLog {
    pub fn info(queue_id: i64, message: impl Into<String>) -> Self {
        Self {
            queue_id,
            log_type: crate::models::log_type::INFO,
            message: message.into(),
        }
    }

    pub fn warn(queue_id: i64, message: impl Into<String>) -> Self {
        Self {
            queue_id,
            log_type: crate::models::log_type::WARN,
            message: message.into(),
        }
    }

    pub fn error(queue_id: i64, message: impl Into<String>) -> Self {
        Self {
            queue_id,
            log_type: crate::models::log_type::ERROR,
            message: message.into(),
        }
    }
}

/// Repository for per-job log lines.
#[derive(Clone)]
pub struct SyncLogRepository {
    db: DatabaseConnection,
}

impl SyncLogRepository {
    /// Create a new SyncLogRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a batch of log lines in one multi-row statement.
    pub async fn append(&self, batch: Vec<NewSyncLog>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let models = batch.into_iter().map(|entry| sync_log::ActiveModel {
            id: NotSet,
            repo_sync_queue_id: Set(entry.queue_id),
            log_type: Set(entry.log_type.to_string()),
            message: Set(entry.message),
            created_at: NotSet,
        });

        sync_log::Entity::insert_many(models).exec(&self.db).await?;
        Ok(())
    }

    /// Append, swallowing failures with a process-level warning. Used on
    /// paths where job logging must not mask the job's own outcome.
    pub async fn append_best_effort(&self, batch: Vec<NewSyncLog>) {
        if let Err(err) = self.append(batch).await {
            warn!(error = %err, "failed to write sync job logs");
        }
    }
}
