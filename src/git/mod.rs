//! # Git Adapter
//!
//! Thin wrapper over the on-disk `git` binary: clone, ls-tree, blame. Every
//! call takes the process cancellation token; a cancelled call kills the
//! child and returns [`SyncError::Cancelled`]. Tool failures surface the
//! child's stderr.

pub mod blame;
pub mod lstree;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{Result, SyncError};
pub use blame::BlameLine;
pub use lstree::TreeObject;

/// Initial capacity of the blame stdout reader. The default line buffer is
/// 64KiB; blame output can carry much longer lines (minified sources), so
/// this matches the 30x adjustment the line scanner has always used.
pub const BLAME_SCAN_BUFFER: usize = 30 * 64 * 1024;

/// Adapter over the `git` binary.
#[derive(Debug, Clone)]
pub struct GitAdapter {
    git_bin: PathBuf,
}

impl Default for GitAdapter {
    fn default() -> Self {
        Self {
            git_bin: PathBuf::from("git"),
        }
    }
}

impl GitAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone `url` into `dest`, authenticating https remotes with `token`.
    /// Passing a ref checks out that branch instead of the remote default.
    pub async fn clone_repo(
        &self,
        cancel: &CancellationToken,
        url: &str,
        token: Option<&str>,
        git_ref: Option<&str>,
        dest: &Path,
    ) -> Result<()> {
        let remote = authenticated_url(url, token);

        let mut args: Vec<String> = vec!["clone".into()];
        if let Some(reference) = git_ref {
            args.push("--branch".into());
            args.push(reference.into());
        }
        args.push(remote);
        args.push(dest.display().to_string());

        debug!(url, dest = %dest.display(), "cloning repository");
        self.run(cancel, "clone", None, &args).await?;
        Ok(())
    }

    /// Recursively list tree entries of `rev` inside `repo_dir`.
    pub async fn ls_tree(
        &self,
        cancel: &CancellationToken,
        repo_dir: &Path,
        rev: &str,
        recurse: bool,
    ) -> Result<Vec<TreeObject>> {
        let mut args: Vec<String> = vec!["ls-tree".into(), "-z".into()];
        if recurse {
            args.push("-r".into());
        }
        args.push(rev.into());

        let stdout = self.run(cancel, "ls-tree", Some(repo_dir), &args).await?;
        lstree::parse(&stdout)
    }

    /// Blame one file at HEAD, streaming `--line-porcelain` output through a
    /// reader sized [`BLAME_SCAN_BUFFER`].
    pub async fn blame(
        &self,
        cancel: &CancellationToken,
        repo_dir: &Path,
        path: &str,
    ) -> Result<Vec<BlameLine>> {
        let mut cmd = self.command(Some(repo_dir));
        cmd.args(["blame", "--line-porcelain", "--", path]);

        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SyncError::git("blame", "stdout not captured"))?;

        let mut reader = BufReader::with_capacity(BLAME_SCAN_BUFFER, stdout);
        let mut parser = blame::PorcelainParser::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = child.start_kill();
                    return Err(SyncError::Cancelled);
                }
                res = reader.read_until(b'\n', &mut buf) => res?,
            };
            if n == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            parser.feed(&buf);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(SyncError::git(
                "blame",
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(parser.finish())
    }

    fn command(&self, current_dir: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.git_bin);
        if let Some(dir) = current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        cmd
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        current_dir: Option<&Path>,
        args: &[String],
    ) -> Result<Vec<u8>> {
        let mut cmd = self.command(current_dir);
        cmd.args(args);

        let child = cmd.spawn()?;
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            res = child.wait_with_output() => res?,
        };

        if !output.status.success() {
            return Err(SyncError::git(
                operation,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(output.stdout)
    }
}

/// Inject the token as the userinfo of an https remote. Non-http remotes
/// and unparseable URLs pass through untouched.
fn authenticated_url(raw: &str, token: Option<&str>) -> String {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return raw.to_string();
    };

    match Url::parse(raw) {
        Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
            if url.set_username(token).is_ok() {
                url.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}
