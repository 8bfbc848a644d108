//! Staging-file plumbing for sync workers.
//!
//! Workers spool their output rows to a newline-delimited JSON file inside
//! the job's scratch directory instead of holding them in memory, then a
//! single bulk COPY loads the file into the result table. Key names are
//! fixed; other readers of the staging stream depend on them.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use uuid::Uuid;

use crate::error::Result;

/// One staged blame row. All fields are nullable on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedBlameLine {
    #[serde(rename = "AuthorEmail")]
    pub author_email: Option<String>,
    #[serde(rename = "AuthorName")]
    pub author_name: Option<String>,
    #[serde(rename = "AuthorWhen")]
    pub author_when: Option<DateTime<FixedOffset>>,
    #[serde(rename = "CommitHash")]
    pub commit_hash: Option<String>,
    #[serde(rename = "LineNo")]
    pub line_no: Option<i64>,
    #[serde(rename = "Line")]
    pub line: Option<String>,
    #[serde(rename = "Path")]
    pub path: Option<String>,
}

/// Append-only writer for the staging file.
pub struct StagingWriter {
    inner: BufWriter<File>,
    count: u64,
}

impl StagingWriter {
    pub async fn create(path: &std::path::Path) -> Result<Self> {
        let file = File::create(path).await?;
        Ok(Self {
            inner: BufWriter::new(file),
            count: 0,
        })
    }

    /// Serialize one record as a single JSON line.
    pub async fn append(&mut self, record: &StagedBlameLine) -> Result<()> {
        let mut buf = serde_json::to_vec(record)?;
        buf.push(b'\n');
        self.inner.write_all(&buf).await?;
        self.count += 1;
        Ok(())
    }

    /// Flush and return how many records were staged.
    pub async fn finish(mut self) -> Result<u64> {
        self.inner.flush().await?;
        Ok(self.count)
    }
}

/// Streaming reader over a staging file.
pub struct StagingReader {
    inner: BufReader<File>,
    line: String,
}

impl StagingReader {
    pub async fn open(path: &std::path::Path) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            inner: BufReader::new(file),
            line: String::new(),
        })
    }

    /// Next staged record, or None at end of file.
    pub async fn next(&mut self) -> Result<Option<StagedBlameLine>> {
        self.line.clear();
        let n = self.inner.read_line(&mut self.line).await?;
        if n == 0 {
            return Ok(None);
        }
        let record = serde_json::from_str(self.line.trim_end_matches('\n'))?;
        Ok(Some(record))
    }
}

/// Encode one staged record as a CSV row for
/// `COPY git_blame ... FROM STDIN (FORMAT csv)`. Column order matches the
/// COPY column list; absent optionals become unquoted empty fields, which
/// CSV COPY reads as NULL.
pub fn encode_copy_row(repo_id: Uuid, record: &StagedBlameLine) -> String {
    let mut row = String::new();
    row.push_str(&repo_id.to_string());
    row.push(',');
    push_opt_quoted(&mut row, record.author_email.as_deref());
    row.push(',');
    push_opt_quoted(&mut row, record.author_name.as_deref());
    row.push(',');
    if let Some(when) = record.author_when {
        row.push_str(&when.to_rfc3339());
    }
    row.push(',');
    push_opt_quoted(&mut row, record.commit_hash.as_deref());
    row.push(',');
    if let Some(line_no) = record.line_no {
        row.push_str(&line_no.to_string());
    }
    row.push(',');
    push_opt_quoted(&mut row, record.line.as_deref());
    row.push(',');
    push_opt_quoted(&mut row, record.path.as_deref());
    row.push('\n');
    row
}

fn push_opt_quoted(row: &mut String, value: Option<&str>) {
    if let Some(value) = value {
        row.push('"');
        for ch in value.chars() {
            if ch == '"' {
                row.push('"');
            }
            row.push(ch);
        }
        row.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> StagedBlameLine {
        StagedBlameLine {
            author_email: Some("ada@example.com".to_string()),
            author_name: Some("Ada Lovelace".to_string()),
            author_when: FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(1_700_000_000, 0)
                .single(),
            commit_hash: Some("8d9f501b1f4b7d4c1f7a35a9cbbd8a1c91f0e2aa".to_string()),
            line_no: Some(1),
            line: Some("hello".to_string()),
            path: Some("a.txt".to_string()),
        }
    }

    #[tokio::test]
    async fn write_then_read_preserves_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blame-objects.ndjson");

        let mut writer = StagingWriter::create(&path).await.expect("create");
        writer.append(&sample()).await.expect("append");
        writer
            .append(&StagedBlameLine {
                line: None, // non-UTF-8 source line
                line_no: Some(2),
                ..sample()
            })
            .await
            .expect("append");
        let count = writer.finish().await.expect("finish");
        assert_eq!(count, 2);

        let mut reader = StagingReader::open(&path).await.expect("open");
        let first = reader.next().await.expect("read").expect("record");
        assert_eq!(first, sample());
        let second = reader.next().await.expect("read").expect("record");
        assert_eq!(second.line, None);
        assert!(reader.next().await.expect("read").is_none());
    }

    #[test]
    fn staged_record_uses_contract_key_names() {
        let json = serde_json::to_value(sample()).expect("serialize");
        let obj = json.as_object().expect("object");
        for key in [
            "AuthorEmail",
            "AuthorName",
            "AuthorWhen",
            "CommitHash",
            "LineNo",
            "Line",
            "Path",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
    }

    #[test]
    fn copy_row_quotes_embedded_quotes_and_commas() {
        let repo_id = Uuid::nil();
        let record = StagedBlameLine {
            line: Some("say \"hi\", twice".to_string()),
            ..sample()
        };

        let row = encode_copy_row(repo_id, &record);
        assert!(row.contains("\"say \"\"hi\"\", twice\""));
        assert!(row.ends_with('\n'));
    }

    #[test]
    fn copy_row_leaves_nulls_unquoted_empty() {
        let record = StagedBlameLine {
            author_email: None,
            author_name: None,
            author_when: None,
            commit_hash: None,
            line_no: Some(7),
            line: None,
            path: Some("a.txt".to_string()),
        };

        let row = encode_copy_row(Uuid::nil(), &record);
        // repo_id,email,name,when,hash,line_no,line,path
        assert_eq!(
            row,
            format!("{},,,,,7,,\"a.txt\"\n", Uuid::nil())
        );
    }
}
