//! Append-only audit trail of node merges.
//!
//! One line per merge, human readable:
//!
//! ```text
//! 2025-03-14 09:26:53 | FFT → Fast Fourier Transform
//! ```
//!
//! Timestamps are UTC. Existing lines are never rewritten.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, TimeZone, Utc};
use conceptgraph_core::MergeRecord;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIELD_SEPARATOR: &str = " | ";
const ARROW: &str = " → ";

/// Render one record as a log line (no trailing newline).
pub fn format_entry(record: &MergeRecord) -> String {
    format!(
        "{}{FIELD_SEPARATOR}{}{ARROW}{}",
        record.merged_at.format(TIMESTAMP_FORMAT),
        record.old_name,
        record.new_name
    )
}

/// Parse a line written by [`format_entry`]. Returns `None` for anything else.
pub fn parse_entry(line: &str) -> Option<MergeRecord> {
    let (stamp, names) = line.split_once(FIELD_SEPARATOR)?;
    let (old_name, new_name) = names.split_once(ARROW)?;
    let naive = NaiveDateTime::parse_from_str(stamp.trim(), TIMESTAMP_FORMAT).ok()?;
    Some(MergeRecord {
        merged_at: Utc.from_utc_datetime(&naive),
        old_name: old_name.to_string(),
        new_name: new_name.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct MergeLog {
    path: PathBuf,
}

impl MergeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records in order. An empty slice does not touch the file.
    pub fn append(&self, records: &[MergeRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory `{}`", parent.display())
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open merge log `{}`", self.path.display()))?;
        let mut text = String::new();
        for record in records {
            text.push_str(&format_entry(record));
            text.push('\n');
        }
        file.write_all(text.as_bytes())?;
        file.sync_data()?;

        tracing::debug!(path = %self.path.display(), entries = records.len(), "merge log appended");
        Ok(())
    }

    /// All well-formed entries, oldest first. A missing log reads as empty.
    pub fn read_entries(&self) -> Result<Vec<MergeRecord>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read merge log `{}`", self.path.display()))
            }
        };

        let mut entries = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_entry(line) {
                Some(record) => entries.push(record),
                None => tracing::warn!(line = lineno + 1, "unrecognized merge log line"),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(old: &str, new: &str) -> MergeRecord {
        MergeRecord {
            merged_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
            old_name: old.to_string(),
            new_name: new.to_string(),
        }
    }

    #[test]
    fn entry_line_format() {
        assert_eq!(
            format_entry(&record("FFT", "Fast Fourier Transform")),
            "2025-03-14 09:26:53 | FFT → Fast Fourier Transform"
        );
        assert!(parse_entry("not a log line").is_none());
    }

    #[test]
    fn append_accumulates_across_calls() {
        let dir = tempdir().unwrap();
        let log = MergeLog::new(dir.path().join("graphs/merge_log.txt"));

        log.append(&[record("binary search", "Binary Search")]).unwrap();
        log.append(&[
            record("BINARY SEARCH", "Binary Search"),
            record("FFT", "Fast Fourier Transform"),
        ])
        .unwrap();

        let entries = log.read_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], record("binary search", "Binary Search"));
        assert_eq!(entries[2].old_name, "FFT");
    }

    #[test]
    fn empty_append_creates_nothing() {
        let dir = tempdir().unwrap();
        let log = MergeLog::new(dir.path().join("merge_log.txt"));
        log.append(&[]).unwrap();
        assert!(!log.path().exists());
        assert!(log.read_entries().unwrap().is_empty());
    }
}
