//! Parser for `git blame --line-porcelain` output.
//!
//! Every output line gets a full header block; the content line follows
//! with a TAB prefix. Header values (author names) and content are raw
//! bytes, not necessarily UTF-8 — content stays as bytes here and is
//! sanitized by the worker.

use chrono::{DateTime, FixedOffset, TimeZone};

/// One blamed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameLine {
    pub commit_hash: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_when: Option<DateTime<FixedOffset>>,
    /// Raw content bytes, without the trailing newline
    pub line: Vec<u8>,
}

/// Incremental porcelain parser fed one output line at a time.
#[derive(Debug, Default)]
pub struct PorcelainParser {
    lines: Vec<BlameLine>,
    commit_hash: Option<String>,
    author_name: Option<String>,
    author_email: Option<String>,
    author_time: Option<i64>,
    author_tz: Option<FixedOffset>,
}

impl PorcelainParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one output line (trailing newline already stripped).
    pub fn feed(&mut self, raw: &[u8]) {
        if let Some(content) = raw.strip_prefix(b"\t") {
            let author_when = match (self.author_time, self.author_tz) {
                (Some(secs), Some(tz)) => tz.timestamp_opt(secs, 0).single(),
                (Some(secs), None) => FixedOffset::east_opt(0)
                    .and_then(|utc| utc.timestamp_opt(secs, 0).single()),
                _ => None,
            };

            self.lines.push(BlameLine {
                commit_hash: self.commit_hash.clone(),
                author_name: self.author_name.clone(),
                author_email: self.author_email.clone(),
                author_when,
                line: content.to_vec(),
            });
            return;
        }

        let text = String::from_utf8_lossy(raw);
        if let Some(value) = text.strip_prefix("author ") {
            self.author_name = Some(value.to_string());
        } else if let Some(value) = text.strip_prefix("author-mail ") {
            self.author_email = Some(strip_angle_brackets(value).to_string());
        } else if let Some(value) = text.strip_prefix("author-time ") {
            self.author_time = value.parse().ok();
        } else if let Some(value) = text.strip_prefix("author-tz ") {
            self.author_tz = parse_tz(value);
        } else if is_header_line(&text) {
            // Start of a new hunk header: "<sha> <orig> <final> [count]"
            self.commit_hash = text.split(' ').next().map(str::to_string);
            self.author_name = None;
            self.author_email = None;
            self.author_time = None;
            self.author_tz = None;
        }
        // committer/summary/filename/previous/boundary lines are not needed
    }

    /// Return the accumulated lines in file order.
    pub fn finish(self) -> Vec<BlameLine> {
        self.lines
    }
}

fn is_header_line(text: &str) -> bool {
    let mut parts = text.split(' ');
    let Some(first) = parts.next() else {
        return false;
    };
    first.len() == 40 && first.bytes().all(|b| b.is_ascii_hexdigit())
}

fn strip_angle_brackets(value: &str) -> &str {
    value
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
}

/// Parse a `+HHMM` / `-HHMM` timezone suffix.
fn parse_tz(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.len() != 5 {
        return None;
    }
    let sign = match value.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = value[1..3].parse().ok()?;
    let minutes: i32 = value[3..5].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
8d9f501b1f4b7d4c1f7a35a9cbbd8a1c91f0e2aa 1 1 2
author Ada Lovelace
author-mail <ada@example.com>
author-time 1700000000
author-tz +0200
committer Ada Lovelace
committer-mail <ada@example.com>
committer-time 1700000000
committer-tz +0200
summary initial commit
filename a.txt
\thello
8d9f501b1f4b7d4c1f7a35a9cbbd8a1c91f0e2aa 2 2
author Ada Lovelace
author-mail <ada@example.com>
author-time 1700000000
author-tz +0200
committer Ada Lovelace
committer-mail <ada@example.com>
committer-time 1700000000
committer-tz +0200
summary initial commit
filename a.txt
\tworld";

    fn parse_sample(text: &str) -> Vec<BlameLine> {
        let mut parser = PorcelainParser::new();
        for line in text.split('\n') {
            parser.feed(line.as_bytes());
        }
        parser.finish()
    }

    #[test]
    fn parses_two_line_file() {
        let lines = parse_sample(SAMPLE);
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0].line, b"hello");
        assert_eq!(lines[1].line, b"world");
        assert_eq!(
            lines[0].commit_hash.as_deref(),
            Some("8d9f501b1f4b7d4c1f7a35a9cbbd8a1c91f0e2aa")
        );
        assert_eq!(lines[0].author_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(lines[0].author_email.as_deref(), Some("ada@example.com"));

        let when = lines[0].author_when.expect("author timestamp parsed");
        assert_eq!(when.timestamp(), 1_700_000_000);
        assert_eq!(when.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn content_may_be_non_utf8() {
        let mut parser = PorcelainParser::new();
        parser.feed(b"8d9f501b1f4b7d4c1f7a35a9cbbd8a1c91f0e2aa 1 1 1");
        parser.feed(b"author A");
        parser.feed(b"author-mail <a@x>");
        parser.feed(b"author-time 1700000000");
        parser.feed(b"author-tz +0000");
        parser.feed(b"\t\xff\xfe not utf8");

        let lines = parser.finish();
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0].line[..2], b"\xff\xfe");
    }

    #[test]
    fn tz_parsing_handles_negative_offsets() {
        let tz = parse_tz("-0530").expect("parses");
        assert_eq!(tz.local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert!(parse_tz("0530").is_none());
        assert!(parse_tz("+05").is_none());
    }

    #[test]
    fn tab_prefixed_content_keeps_inner_tabs() {
        let mut parser = PorcelainParser::new();
        parser.feed(b"8d9f501b1f4b7d4c1f7a35a9cbbd8a1c91f0e2aa 1 1 1");
        parser.feed(b"author A");
        parser.feed(b"author-mail <a@x>");
        parser.feed(b"author-time 1700000000");
        parser.feed(b"author-tz +0000");
        parser.feed(b"\t\tindented\twith\ttabs");

        let lines = parser.finish();
        assert_eq!(lines[0].line, b"\tindented\twith\ttabs");
    }
}
