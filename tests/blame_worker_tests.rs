//! Integration tests for the blame worker's scan-and-stage pipeline,
//! driven against throwaway repositories built with the real `git` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use reposyncd::git::GitAdapter;
use reposyncd::worker::blame::{FileSkip, stage_repo_blame};
use reposyncd::worker::staging::{StagedBlameLine, StagingReader};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const AUTHOR_NAME: &str = "Ada Lovelace";
const AUTHOR_EMAIL: &str = "ada@example.com";

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", AUTHOR_NAME)
        .env("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("GIT_COMMITTER_NAME", AUTHOR_NAME)
        .env("GIT_COMMITTER_EMAIL", AUTHOR_EMAIL)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Build a source repo from (path, bytes) pairs and commit everything.
fn source_repo(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    git(dir.path(), &["init", "-q"]);

    for (path, contents) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(full, contents).expect("write file");
    }

    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "initial"]);
    dir
}

async fn clone_and_stage(
    src: &TempDir,
) -> (TempDir, PathBuf, u64, Vec<FileSkip>) {
    let work = TempDir::new().expect("tempdir");
    let repo_dir = work.path().join("clone");
    let staging_path = work.path().join("blame-objects.ndjson");

    let adapter = GitAdapter::new();
    let cancel = CancellationToken::new();

    adapter
        .clone_repo(
            &cancel,
            &src.path().display().to_string(),
            None,
            None,
            &repo_dir,
        )
        .await
        .expect("clone");

    let (staged, skips) = stage_repo_blame(&adapter, &cancel, &repo_dir, &staging_path)
        .await
        .expect("stage");

    (work, staging_path, staged, skips)
}

async fn read_all(path: &Path) -> Vec<StagedBlameLine> {
    let mut reader = StagingReader::open(path).await.expect("open staging");
    let mut records = Vec::new();
    while let Some(record) = reader.next().await.expect("read staging") {
        records.push(record);
    }
    records
}

#[tokio::test]
async fn stages_every_line_with_authorship() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }

    let src = source_repo(&[("a.txt", b"hello\nworld\n" as &[u8])]);
    let (_work, staging_path, staged, skips) = clone_and_stage(&src).await;

    assert_eq!(staged, 2);
    assert!(skips.is_empty());

    let records = read_all(&staging_path).await;
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].line.as_deref(), Some("hello"));
    assert_eq!(records[0].line_no, Some(1));
    assert_eq!(records[0].path.as_deref(), Some("a.txt"));
    assert_eq!(records[0].author_email.as_deref(), Some(AUTHOR_EMAIL));
    assert_eq!(records[0].author_name.as_deref(), Some(AUTHOR_NAME));
    let hash = records[0].commit_hash.as_deref().expect("commit hash");
    assert_eq!(hash.len(), 40);
    assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
    assert!(records[0].author_when.is_some());

    assert_eq!(records[1].line.as_deref(), Some("world"));
    assert_eq!(records[1].line_no, Some(2));
}

#[tokio::test]
async fn binary_files_are_skipped_with_a_notice() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }

    let src = source_repo(&[
        ("bin.dat", b"\x00\x01\x02binary payload" as &[u8]),
        ("a.txt", b"hello\n"),
    ]);
    let (_work, staging_path, staged, skips) = clone_and_stage(&src).await;

    // Only a.txt contributes rows
    assert_eq!(staged, 1);
    assert!(skips.contains(&FileSkip::Binary {
        path: "bin.dat".to_string()
    }));

    let records = read_all(&staging_path).await;
    assert!(records.iter().all(|r| r.path.as_deref() != Some("bin.dat")));
}

#[tokio::test]
async fn binary_only_repo_stages_zero_rows() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }

    let src = source_repo(&[("bin.dat", b"\x00rest-of-payload" as &[u8])]);
    let (_work, staging_path, staged, skips) = clone_and_stage(&src).await;

    assert_eq!(staged, 0);
    assert_eq!(skips.len(), 1);
    assert!(read_all(&staging_path).await.is_empty());
}

#[tokio::test]
async fn nul_bytes_past_the_sniff_window_are_stripped_from_lines() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }

    // Keep the first 8000 bytes clean so the classifier accepts the file,
    // then plant the NUL-bearing line at the end.
    let mut contents = Vec::new();
    for _ in 0..1000 {
        contents.extend_from_slice(b"aaaaaaaa\n");
    }
    contents.extend_from_slice(b"abc\x00def\n");

    let src = source_repo(&[("big.txt", contents.as_slice())]);
    let (_work, staging_path, staged, skips) = clone_and_stage(&src).await;

    assert_eq!(staged, 1001);
    assert!(skips.is_empty());

    let records = read_all(&staging_path).await;
    let last = records.last().expect("last record");
    assert_eq!(last.line.as_deref(), Some("abcdef"));
    assert_eq!(last.line_no, Some(1001));
}

#[tokio::test]
async fn nested_paths_are_enumerated_recursively() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }

    let src = source_repo(&[
        ("src/lib.rs", b"pub fn answer() -> u32 { 42 }\n" as &[u8]),
        ("docs/guide.md", b"# Guide\n"),
    ]);
    let (_work, staging_path, staged, _skips) = clone_and_stage(&src).await;

    assert_eq!(staged, 2);
    let records = read_all(&staging_path).await;
    let mut paths: Vec<_> = records
        .iter()
        .filter_map(|r| r.path.as_deref())
        .collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["docs/guide.md", "src/lib.rs"]);
}
