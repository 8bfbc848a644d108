//! Error types for the sync service.
//!
//! [`SyncError`] covers job-fatal failures: they roll back whatever
//! transaction was open and leave the queue row for the reaper. Per-file
//! problems inside a worker are not errors at this level; the worker logs
//! a WARN line and skips the file.

use std::path::PathBuf;

use thiserror::Error;

use crate::crypto::CryptoError;

/// Crate-wide result alias.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("git {operation} failed: {stderr}")]
    Git { operation: String, stderr: String },

    #[error("credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("no credential of type {credential_type} found")]
    MissingCredential { credential_type: String },

    #[error("scratch directory unavailable under {root}: {source}")]
    ScratchDir {
        root: PathBuf,
        source: std::io::Error,
    },

    #[error("job cancelled")]
    Cancelled,

    #[error("queue row {queue_id} references malformed data: {message}")]
    CorruptRow { queue_id: i64, message: String },
}

impl SyncError {
    /// Build a git subprocess error from the tool's stderr.
    pub fn git(operation: impl Into<String>, stderr: impl Into<String>) -> Self {
        SyncError::Git {
            operation: operation.into(),
            stderr: stderr.into(),
        }
    }
}

impl From<sea_orm::TryGetError> for SyncError {
    fn from(err: sea_orm::TryGetError) -> Self {
        SyncError::Db(err.into())
    }
}
