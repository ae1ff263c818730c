//! Notification sinks for save subsystem messages.
//!
//! Every failure in the save subsystem is reported to a [`LogSink`] as a
//! `(message, severity)` pair. Sinks only display or record messages; they
//! never influence control flow.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Thread-safe handle to an append-only log file.
pub type LogHandle = Arc<Mutex<Option<File>>>;

/// Severity attached to a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "NOTE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    fn level(&self) -> log::Level {
        match self {
            Severity::Note => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

/// Receiver of user-visible save subsystem messages.
pub trait LogSink: Send + Sync {
    fn send(&self, message: &str, severity: Severity);
}

/// Forwards messages to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacadeSink;

impl LogSink for LogFacadeSink {
    fn send(&self, message: &str, severity: Severity) {
        log::log!(target: "savekeeper", severity.level(), "{message}");
    }
}

/// Format a UTC time as ISO 8601 with milliseconds (e.g. 2026-02-04T10:15:30.123Z).
fn utc_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Write a timestamped line to the log file (if present).
pub fn log_line(handle: &LogHandle, severity: Severity, data: &str) {
    if let Ok(mut guard) = handle.lock() {
        if let Some(ref mut file) = *guard {
            let ts = utc_timestamp(Utc::now());
            let _ = writeln!(file, "[{}] {}: {}", ts, severity.as_str(), data);
            let _ = file.flush();
        }
    }
}

/// Open (or create) a log file at `{log_dir}/{log_id}.log` and return a shared handle.
pub fn open_log_file(log_dir: Option<&Path>, log_id: &str) -> LogHandle {
    let file = log_dir.and_then(|dir| {
        let path = dir.join(format!("{}.log", log_id));
        std::fs::create_dir_all(dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    Arc::new(Mutex::new(file))
}

/// Appends every message to a log file and mirrors it to the `log` facade.
#[derive(Clone)]
pub struct FileLogSink {
    handle: LogHandle,
}

impl FileLogSink {
    pub fn open(log_dir: Option<&Path>, log_id: &str) -> Self {
        Self {
            handle: open_log_file(log_dir, log_id),
        }
    }
}

impl LogSink for FileLogSink {
    fn send(&self, message: &str, severity: Severity) {
        log_line(&self.handle, severity, message);
        LogFacadeSink.send(message, severity);
    }
}

/// One message captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
    pub at: DateTime<Utc>,
}

/// Keeps every message in memory, for on-screen log panels.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured messages, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// True if any captured message at `severity` contains `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn send(&self, message: &str, severity: Severity) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                message: message.to_string(),
                severity,
                at: Utc::now(),
            });
        }
    }
}
