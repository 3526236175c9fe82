//! Persistent record store for processed URLs
//!
//! The key file is an append-only CSV, one record per line. It is the single
//! source of truth for "work done": loading it yields the dedup set for the next
//! run, and searching it scans the same file. Failed URLs never appear here and
//! so remain eligible for reprocessing.

use crate::SnapshotError;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One persisted outcome of processing a URL.
///
/// The thumbnail field is present iff thumbnailing was available and succeeded
/// for this URL. Records are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub url: String,
    pub fullsize: String,
    pub thumbnail: Option<String>,
}

impl Record {
    pub fn new(url: String, fullsize: String, thumbnail: Option<String>) -> Self {
        Self {
            url,
            fullsize,
            thumbnail,
        }
    }

    /// Serialize as a single CSV line (no trailing newline).
    pub fn to_csv_line(&self) -> String {
        let mut fields = vec![escape_csv_field(&self.url), escape_csv_field(&self.fullsize)];
        if let Some(thumb) = &self.thumbnail {
            fields.push(escape_csv_field(thumb));
        }
        fields.join(",")
    }

    /// Parse a CSV line back into a record. Returns `None` for blank or
    /// malformed lines, which are skipped rather than treated as fatal.
    pub fn parse_csv_line(line: &str) -> Option<Self> {
        let fields = parse_csv_fields(line)?;
        if fields.len() < 2 {
            return None;
        }
        let mut iter = fields.into_iter();
        let url = iter.next()?;
        let fullsize = iter.next()?;
        Some(Self {
            url,
            fullsize,
            thumbnail: iter.next(),
        })
    }

    /// Human-readable form used by `search` output: fields joined by ", ".
    pub fn display_line(&self) -> String {
        match &self.thumbnail {
            Some(thumb) => format!("{}, {}, {}", self.url, self.fullsize, thumb),
            None => format!("{}, {}", self.url, self.fullsize),
        }
    }
}

/// Quote a field if it contains a comma, quote or newline.
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Quote-aware CSV field splitter. Returns `None` for empty lines.
fn parse_csv_fields(line: &str) -> Option<Vec<String>> {
    if line.trim().is_empty() {
        return None;
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                // Doubled quote inside a quoted field is an escaped quote
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);

    Some(fields)
}

/// Append-only store of [`Record`]s, doubling as dedup and search index.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set of URLs already processed in earlier runs.
    ///
    /// A missing key file means no work has been done yet and yields an empty
    /// set, not an error.
    pub async fn load(&self) -> Result<HashSet<String>, SnapshotError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter_map(Record::parse_csv_line)
            .map(|record| record.url)
            .collect())
    }

    /// Records whose URL contains `term` as a substring, in log order.
    ///
    /// Re-scans the file on every call; the match is case-sensitive. A missing
    /// key file yields no matches.
    pub async fn search(&self, term: &str) -> Result<Vec<Record>, SnapshotError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter_map(Record::parse_csv_line)
            .filter(|record| record.url.contains(term))
            .collect())
    }

    /// Open the key file for appending, creating it if necessary.
    ///
    /// Exactly one appender exists per run and only the dispatcher's writer
    /// task touches it, so appends never interleave.
    pub async fn open_appender(&self) -> Result<LogAppender, SnapshotError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;

        Ok(LogAppender { file })
    }
}

/// Exclusive append cursor over the key file.
#[derive(Debug)]
pub struct LogAppender {
    file: File,
}

impl LogAppender {
    /// Durably add one record. One record = one line, written and flushed as a
    /// unit, so a crash mid-run leaves a valid partial log.
    pub async fn append(&mut self, record: &Record) -> Result<(), SnapshotError> {
        let mut line = record.to_csv_line();
        line.push('\n');
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }
}
