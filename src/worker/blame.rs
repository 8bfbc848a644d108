//! Git blame sync worker.
//!
//! Clone, walk HEAD's tree, classify binaries, blame every text blob, spool
//! rows to a staging file, then publish atomically: delete the repo's old
//! blame rows, bulk-load the staged set, and flip the queue row to DONE in
//! one transaction. Per-file problems are logged WARN and skipped; anything
//! that escapes this function leaves the row RUNNING for the reaper.

use std::path::Path;

use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::git::GitAdapter;
use crate::models::status;
use crate::repositories::{DequeuedJob, NewSyncLog};
use crate::worker::WorkerContext;
use crate::worker::staging::{StagedBlameLine, StagingReader, StagingWriter, encode_copy_row};

/// How many bytes of a file the binary classifier inspects.
const BINARY_SNIFF_LEN: usize = 8000;

/// Bytes buffered per COPY send.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

const COPY_GIT_BLAME: &str = "COPY git_blame \
    (repo_id, author_email, author_name, author_when, commit_hash, line_no, line, path) \
    FROM STDIN (FORMAT csv)";

/// A file the scan passed over instead of failing the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSkip {
    Binary { path: String },
    ReadError { path: String, message: String },
    BlameError { path: String, message: String },
}

impl FileSkip {
    fn into_log(self, queue_id: i64) -> NewSyncLog {
        match self {
            FileSkip::Binary { path } => {
                NewSyncLog::info(queue_id, format!("skipping binary file: {}", path))
            }
            FileSkip::ReadError { message, .. } => {
                NewSyncLog::warn(queue_id, format!("error reading file in repo: {}", message))
            }
            FileSkip::BlameError { message, .. } => {
                NewSyncLog::warn(queue_id, format!("error blaming file in repo: {}", message))
            }
        }
    }
}

/// Run one blame sync end to end.
#[instrument(skip(ctx, cancel), fields(queue_id = job.id, repo = %job.repo))]
pub async fn sync_git_blame(
    ctx: &WorkerContext,
    job: &DequeuedJob,
    cancel: &CancellationToken,
) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("reposyncd-repo-")
        .tempdir_in(&ctx.config.git_clone_path)
        .map_err(|source| SyncError::ScratchDir {
            root: ctx.config.git_clone_path.clone(),
            source,
        })?;

    let token = ctx.credentials.github_token().await?;

    let repo_dir = scratch.path().join("repo");
    ctx.git
        .clone_repo(
            cancel,
            &job.repo,
            Some(&token),
            job.git_ref.as_deref(),
            &repo_dir,
        )
        .await?;

    let staging_path = scratch.path().join("blame-objects.ndjson");
    let (staged, skips) = stage_repo_blame(&ctx.git, cancel, &repo_dir, &staging_path).await?;
    info!(staged, skipped = skips.len(), "staged blame lines");

    ctx.logs
        .append_best_effort(
            skips
                .into_iter()
                .map(|skip| skip.into_log(job.id))
                .collect(),
        )
        .await;

    publish(ctx, job, &staging_path).await?;

    ctx.logs
        .append_best_effort(vec![NewSyncLog::info(
            job.id,
            format!("finished syncing {} for {}", job.sync_type, job.repo),
        )])
        .await;

    Ok(())
}

/// Walk HEAD's blobs and spool one staged record per blamed line. Binary
/// files, unreadable files, and blame failures are skipped and reported;
/// only cancellation and staging I/O abort the scan.
pub async fn stage_repo_blame(
    git: &GitAdapter,
    cancel: &CancellationToken,
    repo_dir: &Path,
    staging_path: &Path,
) -> Result<(u64, Vec<FileSkip>)> {
    let objects = git.ls_tree(cancel, repo_dir, "HEAD", true).await?;

    let mut writer = StagingWriter::create(staging_path).await?;
    let mut skips = Vec::new();

    for object in objects.iter().filter(|o| o.is_blob()) {
        let full_path = repo_dir.join(&object.path);

        match peek_is_binary(&full_path).await {
            Ok(false) => {}
            Ok(true) => {
                info!(path = %object.path, "skipping binary file");
                skips.push(FileSkip::Binary {
                    path: object.path.clone(),
                });
                continue;
            }
            Err(err) => {
                warn!(path = %object.path, error = %err, "error reading file in repo");
                skips.push(FileSkip::ReadError {
                    path: object.path.clone(),
                    message: err.to_string(),
                });
                continue;
            }
        }

        let blamed = match git.blame(cancel, repo_dir, &object.path).await {
            Ok(lines) => lines,
            Err(err @ SyncError::Cancelled) => return Err(err),
            Err(err) => {
                warn!(path = %object.path, error = %err, "error blaming file in repo");
                skips.push(FileSkip::BlameError {
                    path: object.path.clone(),
                    message: err.to_string(),
                });
                continue;
            }
        };

        for (idx, blame_line) in blamed.into_iter().enumerate() {
            let record = StagedBlameLine {
                author_email: blame_line.author_email,
                author_name: blame_line.author_name,
                author_when: blame_line.author_when,
                commit_hash: blame_line.commit_hash,
                line_no: Some(idx as i64 + 1),
                line: sanitize_line(blame_line.line),
                path: Some(object.path.clone()),
            };
            writer.append(&record).await?;
        }
    }

    let staged = writer.finish().await?;
    Ok((staged, skips))
}

/// Replace the repo's blame rows and mark the job DONE in one transaction.
async fn publish(ctx: &WorkerContext, job: &DequeuedJob, staging_path: &Path) -> Result<()> {
    let pool = ctx.db.get_postgres_connection_pool();
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM git_blame WHERE repo_id = $1")
        .bind(job.repo_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    ctx.logs
        .append_best_effort(vec![NewSyncLog::info(
            job.id,
            format!("removed {} row(s) from git_blame", deleted),
        )])
        .await;

    let mut sink = tx.copy_in_raw(COPY_GIT_BLAME).await?;
    let mut reader = StagingReader::open(staging_path).await?;
    let mut chunk = Vec::with_capacity(COPY_CHUNK_BYTES);
    let mut inserted: u64 = 0;

    loop {
        let record = match reader.next().await {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(err) => {
                // Abort the COPY before surfacing, or the connection is stuck
                sink.abort("staging file unreadable").await?;
                return Err(err);
            }
        };

        chunk.extend_from_slice(encode_copy_row(job.repo_id, &record).as_bytes());
        inserted += 1;

        if chunk.len() >= COPY_CHUNK_BYTES {
            sink.send(chunk.as_slice()).await?;
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        sink.send(chunk.as_slice()).await?;
    }
    sink.finish().await?;

    ctx.logs
        .append_best_effort(vec![NewSyncLog::info(
            job.id,
            format!("inserted {} row(s) into git_blame", inserted),
        )])
        .await;

    sqlx::query("UPDATE repo_sync_queue SET status = $1, done_at = now() WHERE id = $2")
        .bind(status::DONE)
        .bind(job.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(deleted, inserted, "published blame rows");
    Ok(())
}

/// A file is binary when its first [`BINARY_SNIFF_LEN`] bytes contain a NUL
/// byte. Matches the classifier the legacy pipeline used, so the set of
/// blamed files does not drift during migration.
pub(crate) fn is_binary(buffer: &[u8]) -> bool {
    buffer.contains(&0)
}

/// Open the working-tree file and sniff its head. The handle closes as soon
/// as this returns, so jobs over large trees never accumulate descriptors.
async fn peek_is_binary(path: &Path) -> std::io::Result<bool> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buffer = vec![0u8; BINARY_SNIFF_LEN];
    let mut filled = 0;

    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(is_binary(&buffer[..filled]))
}

/// Datastore text columns cannot hold NUL. Non-UTF-8 lines are stored as
/// NULL; valid lines keep everything except embedded U+0000.
pub(crate) fn sanitize_line(raw: Vec<u8>) -> Option<String> {
    match String::from_utf8(raw) {
        Ok(text) => Some(text.replace('\u{0000}', "")),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_anywhere_in_head_is_binary() {
        assert!(is_binary(b"\x00rest"));
        assert!(is_binary(b"prefix\x00suffix"));
        assert!(!is_binary(b"plain text"));
        assert!(!is_binary(b""));
    }

    #[test]
    fn sanitize_strips_embedded_nul() {
        assert_eq!(
            sanitize_line(b"abc\x00def".to_vec()).as_deref(),
            Some("abcdef")
        );
    }

    #[test]
    fn sanitize_keeps_plain_lines() {
        assert_eq!(
            sanitize_line(b"fn main() {}".to_vec()).as_deref(),
            Some("fn main() {}")
        );
    }

    #[test]
    fn sanitize_rejects_invalid_utf8() {
        assert_eq!(sanitize_line(vec![0xff, 0xfe, 0x41]), None);
    }

    #[tokio::test]
    async fn peek_reads_at_most_the_sniff_window() {
        let dir = tempfile::tempdir().expect("tempdir");

        // NUL beyond the sniff window is not binary
        let mut tail_nul = vec![b'a'; BINARY_SNIFF_LEN];
        tail_nul.push(0);
        let clean_path = dir.path().join("clean.txt");
        std::fs::write(&clean_path, &tail_nul).expect("write");
        assert!(!peek_is_binary(&clean_path).await.expect("peek"));

        let binary_path = dir.path().join("bin.dat");
        std::fs::write(&binary_path, b"\x00binary").expect("write");
        assert!(peek_is_binary(&binary_path).await.expect("peek"));
    }
}
