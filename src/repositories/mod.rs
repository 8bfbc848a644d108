//! # Repositories
//!
//! Database access layers. The queue repository speaks raw Postgres for the
//! protocol statements (skip-locked dequeue, generation-barrier enqueue,
//! reaper sweep); the rest go through SeaORM entities.

pub mod credential;
pub mod queue;
pub mod sync_log;

pub use credential::CredentialResolver;
pub use queue::{DequeuedJob, QueueRepository};
pub use sync_log::{NewSyncLog, SyncLogRepository};
