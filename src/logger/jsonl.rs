//! JSONL event log: append-only line-delimited JSON.
//!
//! The dashboard owns the terminal while it runs, so nothing may print to
//! stdout or stderr; events go to a log file instead. Each line is a
//! self-contained JSON object assembled in memory and written with a single
//! `write_all` so a concurrent `tail -f` never sees a partial line.
//!
//! Degradation chain: file → silent discard. The render loop must never
//! crash (or scribble on the screen) because of a logging failure.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Event types matching the dashboard activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DashboardStart,
    DashboardStop,
    PollComplete,
    PollFailed,
    ActionComplete,
    ActionFailed,
}

/// A single JSONL log entry — all fields optional except `ts`, `event`,
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Event type identifier.
    pub event: EventType,
    /// Severity level.
    pub severity: Severity,
    /// Action or view name (when applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Target entity identifier (job id, process identity, queue name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Duration of the operation in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Snapshot version published by a completed poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
            severity,
            action: None,
            target: None,
            duration_ms: None,
            version: None,
            error_message: None,
            details: None,
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn error_message(mut self, msg: impl Into<String>) -> Self {
        self.error_message = Some(msg.into());
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

/// Append-only JSONL log writer.
///
/// `JsonlLogger::disabled()` produces a no-op writer so call sites never
/// branch on whether logging is configured.
pub struct JsonlLogger {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl JsonlLogger {
    /// Open the log file for appending. Open failure degrades to discard.
    pub fn open(path: &Path) -> Self {
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(BufWriter::new)
            .ok();
        Self {
            writer,
            path: Some(path.to_path_buf()),
        }
    }

    /// A logger that discards everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            writer: None,
            path: None,
        }
    }

    /// Whether entries are actually being persisted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Log file path, when one was configured.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write a single log entry as one atomic JSONL line.
    pub fn write(&mut self, entry: &LogEntry) {
        let Some(w) = self.writer.as_mut() else {
            return;
        };
        let Ok(json) = serde_json::to_string(entry) else {
            return;
        };
        let line = format!("{json}\n");
        if w.write_all(line.as_bytes()).is_err() || w.flush().is_err() {
            // Write failure degrades permanently to discard.
            self.writer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn writes_one_parseable_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qtop.jsonl");
        let mut logger = JsonlLogger::open(&path);
        assert!(logger.is_active());

        logger.write(&LogEntry::new(EventType::DashboardStart, Severity::Info));
        logger.write(
            &LogEntry::new(EventType::ActionFailed, Severity::Warning)
                .action("retry_job")
                .target("jid-123")
                .error_message("job not found: jid-123"),
        );

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(v.get("ts").is_some());
            assert!(v.get("event").is_some());
        }
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "action_failed");
        assert_eq!(second["target"], "jid-123");
    }

    #[test]
    fn disabled_logger_discards_silently() {
        let mut logger = JsonlLogger::disabled();
        assert!(!logger.is_active());
        logger.write(&LogEntry::new(EventType::PollFailed, Severity::Error));
    }

    #[test]
    fn unwritable_path_degrades_to_discard() {
        let mut logger = JsonlLogger::open(Path::new("/nonexistent-dir/qtop.jsonl"));
        assert!(!logger.is_active());
        logger.write(&LogEntry::new(EventType::PollComplete, Severity::Info));
    }
}
