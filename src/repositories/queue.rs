//! # Queue Repository
//!
//! The queue protocol lives here as raw Postgres statements: the store is
//! the sole arbiter of coordination between dispatchers, so every admission
//! decision happens inside the statement that mutates the row.

use chrono::{DateTime, FixedOffset};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement, Value};
use serde_json::Value as JsonValue;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::status;

/// One dequeued job, enriched with its binding and repo.
#[derive(Debug, Clone)]
pub struct DequeuedJob {
    /// Queue row id
    pub id: i64,
    /// When the row was enqueued
    pub created_at: DateTime<FixedOffset>,
    /// Binding id
    pub repo_sync_id: Uuid,
    /// Repo id
    pub repo_id: Uuid,
    /// Sync type tag, selects the worker payload
    pub sync_type: String,
    /// Binding settings
    pub sync_settings: JsonValue,
    /// Clone URL
    pub repo: String,
    /// Optional branch ref
    pub git_ref: Option<String>,
    /// Repo settings
    pub repo_settings: JsonValue,
}

/// Enqueue every due binding, respecting the per-group generation barrier.
///
/// The ranked_queue CTE ranks unfinished rows per type group; a group with
/// any unfinished row admits nothing, so a group drains its whole batch
/// before the next one is inserted.
const ENQUEUE_ALL_SYNCS: &str = r#"
WITH ranked_queue AS (
    SELECT
        rsq.done_at,
        rst.type_group,
        rsq.created_at,
        DENSE_RANK() OVER (PARTITION BY rst.type_group ORDER BY rst.type_group, rsq.created_at DESC) AS rank_num
    FROM repo_syncs AS rs
    INNER JOIN repo_sync_queue AS rsq ON rs.id = rsq.repo_sync_id
    INNER JOIN repo_sync_types AS rst ON rs.sync_type = rst.type
    WHERE rsq.done_at IS NULL
)
INSERT INTO repo_sync_queue (repo_sync_id, status, priority, type_group)
SELECT
    rs.id,
    'QUEUED' AS status,
    rs.priority,
    rst.type_group
FROM repo_syncs rs
INNER JOIN repo_sync_types AS rst ON rs.sync_type = rst.type
WHERE rs.schedule_enabled
    AND rs.id NOT IN (SELECT repo_sync_id FROM repo_sync_queue WHERE status = 'RUNNING' OR status = 'QUEUED')
    AND NOT EXISTS (
        SELECT rq.done_at
        FROM ranked_queue rq
        WHERE rq.rank_num >= 1 AND rq.type_group = rst.type_group
    )
ORDER BY rs.priority, rs.sync_type DESC
"#;

/// Claim the next runnable row.
///
/// The concurrency ceiling is evaluated inside the same statement that
/// flips the status, and FOR UPDATE SKIP LOCKED lets concurrent dispatchers
/// pass over each other's candidate row instead of serializing on it.
const DEQUEUE_SYNC_JOB: &str = r#"
WITH
running AS (
    SELECT rsq.id, rsq.type_group
    FROM repo_sync_queue rsq
    WHERE rsq.status = 'RUNNING'
),
dequeued AS (
    UPDATE repo_sync_queue SET status = 'RUNNING', started_at = now()
    WHERE id IN (
        SELECT rsq.id
        FROM repo_sync_queue rsq
        INNER JOIN repo_sync_type_groups rstg ON rsq.type_group = rstg."group"
        WHERE rsq.status = 'QUEUED'
        AND rstg.concurrent_syncs > (SELECT COUNT(*) FROM running WHERE running.type_group = rstg."group")
        ORDER BY rsq.priority ASC, rsq.created_at ASC, rsq.id ASC LIMIT 1 FOR UPDATE SKIP LOCKED
    ) RETURNING id, created_at, repo_sync_id
)
SELECT
    dequeued.id AS id,
    dequeued.created_at AS created_at,
    dequeued.repo_sync_id AS repo_sync_id,
    rs.repo_id AS repo_id,
    rs.sync_type AS sync_type,
    rs.settings AS sync_settings,
    r.repo AS repo,
    r."ref" AS git_ref,
    r.settings AS repo_settings
FROM dequeued
JOIN repo_syncs rs ON rs.id = dequeued.repo_sync_id
JOIN repos r ON r.id = rs.repo_id
"#;

const SET_KEEP_ALIVE: &str = "UPDATE repo_sync_queue SET last_keep_alive = now() WHERE id = $1";

/// Status updates stamp the timestamp matching the transition so the
/// generation barrier (done_at) and reaper predicate (started_at) stay
/// consistent with the state machine.
const SET_STATUS: &str = r#"
UPDATE repo_sync_queue SET
    status = $1,
    started_at = CASE WHEN $1 = 'RUNNING' THEN now() ELSE started_at END,
    done_at = CASE WHEN $1 = 'DONE' THEN now() ELSE done_at END
WHERE id = $2
"#;

/// Time out RUNNING rows with a stale heartbeat (or, if the worker died
/// before its first heartbeat, a stale started_at) and log why.
const MARK_SYNCS_AS_TIMED_OUT: &str = r#"
WITH timed_out_sync_jobs AS (
    UPDATE repo_sync_queue SET status = 'DONE', done_at = now()
    WHERE status = 'RUNNING' AND (
        (last_keep_alive < now() - make_interval(mins => $1::int))
        OR
        (last_keep_alive IS NULL AND started_at < now() - make_interval(mins => $1::int)))
    RETURNING id
)
INSERT INTO repo_sync_logs (repo_sync_queue_id, log_type, message)
SELECT id, 'ERROR', 'No response from job within reasonable interval. Timing out.' FROM timed_out_sync_jobs
RETURNING repo_sync_queue_id
"#;

/// Repository for queue protocol operations.
#[derive(Clone)]
pub struct QueueRepository {
    db: DatabaseConnection,
}

impl QueueRepository {
    /// Create a new QueueRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a QUEUED row for every due binding. Returns how many rows
    /// were inserted. The statement is atomic; a failed tick inserts
    /// nothing and the next tick retries from scratch.
    #[instrument(skip(self))]
    pub async fn enqueue_all_due(&self) -> Result<u64> {
        let stmt = Statement::from_string(self.db.get_database_backend(), ENQUEUE_ALL_SYNCS);
        let res = self.db.execute(stmt).await?;
        Ok(res.rows_affected())
    }

    /// Claim the next runnable job, or None when nothing is eligible.
    #[instrument(skip(self))]
    pub async fn dequeue(&self) -> Result<Option<DequeuedJob>> {
        let stmt = Statement::from_string(self.db.get_database_backend(), DEQUEUE_SYNC_JOB);
        let Some(row) = self.db.query_one(stmt).await? else {
            return Ok(None);
        };

        Ok(Some(DequeuedJob {
            id: row.try_get("", "id")?,
            created_at: row.try_get("", "created_at")?,
            repo_sync_id: row.try_get("", "repo_sync_id")?,
            repo_id: row.try_get("", "repo_id")?,
            sync_type: row.try_get("", "sync_type")?,
            sync_settings: row.try_get("", "sync_settings")?,
            repo: row.try_get("", "repo")?,
            git_ref: row.try_get("", "git_ref")?,
            repo_settings: row.try_get("", "repo_settings")?,
        }))
    }

    /// Refresh the heartbeat on a RUNNING row.
    pub async fn set_keep_alive(&self, queue_id: i64) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            SET_KEEP_ALIVE,
            [Value::from(queue_id)],
        );
        self.db.execute(stmt).await?;
        Ok(())
    }

    /// Transition a row to the given status, stamping started_at/done_at.
    pub async fn set_status(&self, queue_id: i64, new_status: &str) -> Result<()> {
        debug_assert!(matches!(
            new_status,
            status::QUEUED | status::RUNNING | status::DONE
        ));
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            SET_STATUS,
            [Value::from(new_status), Value::from(queue_id)],
        );
        self.db.execute(stmt).await?;
        Ok(())
    }

    /// Sweep abandoned RUNNING rows. Returns the ids that were timed out.
    #[instrument(skip(self))]
    pub async fn mark_timed_out(&self, timeout_minutes: u32) -> Result<Vec<i64>> {
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            MARK_SYNCS_AS_TIMED_OUT,
            [Value::from(timeout_minutes as i32)],
        );
        let rows = self.db.query_all(stmt).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get::<i64>("", "repo_sync_queue_id")?);
        }
        Ok(ids)
    }
}
