//! Line-oriented parser for `git log --name-status` output
//!
//! The producer emits one marker line per commit followed by its path lines:
//!
//! ```text
//! =2024-03-01 0123456789abcdef0123456789abcdef01234567 alice@example.com
//! M	src/main/App.java
//! D	docs/old.md
//! ```
//!
//! Field boundaries are fixed by the format string the producer is invoked
//! with, so the marker is sliced by position rather than tokenized.

use crate::error::MalformedLine;
use std::ops::Range;

/// First character of every commit marker line
pub const RECORD_MARKER: char = '=';
/// Author date, `YYYY-MM-DD`
pub const DATE_RANGE: Range<usize> = 1..11;
/// Full 40-character commit id
pub const COMMIT_RANGE: Range<usize> = 12..52;
/// Start of the author e-mail; runs to end of line
pub const AUTHOR_START: usize = 53;

/// Status of one path within a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Other(char),
}

impl ChangeStatus {
    pub fn from_char(c: char) -> Self {
        match c {
            'A' => ChangeStatus::Added,
            'M' => ChangeStatus::Modified,
            'D' => ChangeStatus::Deleted,
            'R' => ChangeStatus::Renamed,
            other => ChangeStatus::Other(other),
        }
    }
}

/// The marker line that opens a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHeader {
    pub date: String,
    pub commit: String,
    /// Author field as emitted by the producer, trimmed
    pub author_email: String,
    /// Local part of the e-mail; `None` when the field has no `@`
    pub author: Option<String>,
}

impl CommitHeader {
    pub fn is_author_known(&self) -> bool {
        self.author.is_some()
    }
}

/// One touched path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub status: ChangeStatus,
    pub path: String,
}

/// One meaningful line of log output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Header(CommitHeader),
    Change(PathChange),
    Malformed(MalformedLine),
}

/// Lazy parser over any source of lines
///
/// Blank lines produce nothing; every other line produces exactly one record.
pub struct LogParser<L> {
    lines: L,
    line_no: usize,
}

impl<L> LogParser<L> {
    pub fn new(lines: L) -> Self {
        Self { lines, line_no: 0 }
    }
}

impl<'a> LogParser<std::str::Lines<'a>> {
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.lines())
    }
}

impl<L, S> Iterator for LogParser<L>
where
    L: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        loop {
            let raw = self.lines.next()?;
            self.line_no += 1;
            let line = raw.as_ref().trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_line(line, self.line_no));
        }
    }
}

/// Parse a single non-blank line
pub fn parse_line(line: &str, line_no: usize) -> LogRecord {
    let is_marker = line.starts_with(RECORD_MARKER);
    let result = if is_marker {
        parse_header(line).map(LogRecord::Header)
    } else {
        parse_change(line).map(LogRecord::Change)
    };
    result.unwrap_or_else(|reason| {
        LogRecord::Malformed(MalformedLine {
            line_no,
            is_marker,
            reason,
        })
    })
}

fn parse_header(line: &str) -> Result<CommitHeader, String> {
    let bytes = line.as_bytes();
    if bytes.len() < COMMIT_RANGE.end {
        return Err(format!(
            "marker line has {} bytes, expected at least {}",
            bytes.len(),
            COMMIT_RANGE.end
        ));
    }
    if bytes[DATE_RANGE.end] != b' ' {
        return Err("no separator after date".to_string());
    }
    if bytes.len() > COMMIT_RANGE.end && bytes[COMMIT_RANGE.end] != b' ' {
        return Err("no separator after commit id".to_string());
    }

    let date = line
        .get(DATE_RANGE)
        .ok_or_else(|| "date field is not valid text".to_string())?;
    let commit = line
        .get(COMMIT_RANGE)
        .ok_or_else(|| "commit field is not valid text".to_string())?;
    let author_email = line.get(AUTHOR_START..).unwrap_or("").trim();

    Ok(CommitHeader {
        date: date.to_string(),
        commit: commit.to_string(),
        author_email: author_email.to_string(),
        author: canonical_author(author_email),
    })
}

fn parse_change(line: &str) -> Result<PathChange, String> {
    let mut chars = line.chars();
    let status = chars
        .next()
        .ok_or_else(|| "empty path line".to_string())?;
    let path = chars.as_str().trim_start();
    if path.is_empty() {
        return Err(format!("status '{}' without a path", status));
    }
    let path = unquote_path(path)?;
    if path.is_empty() {
        return Err(format!("status '{}' with an empty quoted path", status));
    }
    Ok(PathChange {
        status: ChangeStatus::from_char(status),
        path,
    })
}

/// Undo git's C-style quoting of a path field
///
/// `core.quotepath=off` only stops the octal escaping of non-ASCII bytes;
/// paths containing `"`, `\`, or control characters still arrive wrapped in
/// double quotes with backslash escapes. Unquoted fields are returned as is.
pub fn unquote_path(field: &str) -> Result<String, String> {
    let Some(inner) = field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return Ok(field.to_string());
    };

    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let escape = *bytes
            .get(i + 1)
            .ok_or_else(|| "dangling escape in quoted path".to_string())?;
        let value = match escape {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            b'"' => b'"',
            b'\\' => b'\\',
            b'0'..=b'3' => {
                let digits = bytes
                    .get(i + 1..i + 4)
                    .ok_or_else(|| "truncated octal escape in quoted path".to_string())?;
                let mut value = 0u8;
                for digit in digits {
                    if !(b'0'..=b'7').contains(digit) {
                        return Err("invalid octal escape in quoted path".to_string());
                    }
                    value = value * 8 + (digit - b'0');
                }
                i += 2;
                value
            }
            other => return Err(format!("unknown escape '\\{}' in quoted path", other as char)),
        };
        out.push(value);
        i += 2;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Local part of an e-mail address, or `None` if it is not one
pub fn canonical_author(email: &str) -> Option<String> {
    email.split_once('@').map(|(local, _)| local.to_string())
}
