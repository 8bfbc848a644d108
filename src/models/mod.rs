//! # Data Models
//!
//! SeaORM entities for the sync service tables, plus the string constants
//! shared by the queue protocol.

pub mod git_blame;
pub mod queue_entry;
pub mod repo;
pub mod repo_sync;
pub mod service_credential;
pub mod sync_log;
pub mod sync_type;
pub mod sync_type_group;

pub use git_blame::Entity as GitBlame;
pub use queue_entry::Entity as QueueEntry;
pub use repo::Entity as Repo;
pub use repo_sync::Entity as RepoSync;
pub use service_credential::Entity as ServiceCredential;
pub use sync_log::Entity as SyncLog;
pub use sync_type::Entity as SyncType;
pub use sync_type_group::Entity as SyncTypeGroup;

/// Queue row statuses. Transitions form a DAG: QUEUED -> RUNNING -> DONE.
pub mod status {
    pub const QUEUED: &str = "QUEUED";
    pub const RUNNING: &str = "RUNNING";
    pub const DONE: &str = "DONE";
}

/// Per-job log line severities.
pub mod log_type {
    pub const INFO: &str = "INFO";
    pub const WARN: &str = "WARN";
    pub const ERROR: &str = "ERROR";
}

/// Sync type tags with a registered worker.
pub const SYNC_TYPE_GIT_BLAME: &str = "GIT_BLAME";

/// Credential type for GitHub personal access tokens.
pub const CREDENTIAL_TYPE_GITHUB_PAT: &str = "GITHUB_PAT";
