//! Inspection event log
//!
//! Events live in memory and are appended to a backing file as JSON lines.
//! The file write happens before the in-memory commit, so the two can never
//! diverge: a failed append leaves the list untouched and the call fails.
//! Bulk save/load to JSON and CSV is lenient on load: a missing or malformed
//! file yields an empty list.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::StationError;
use crate::filesys::File;

/// Timestamp layout for event entries (ISO-8601, second precision)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 timestamp
    pub timestamp: String,

    /// Type/category of the event
    pub event_type: String,

    /// Human readable description
    pub message: String,

    /// Extra metadata associated with the event
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// CSV row shape: metadata is itself JSON-encoded inside its cell, with an
/// empty cell for absent metadata.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: String,
    event_type: String,
    message: String,
    #[serde(default)]
    metadata: String,
}

/// Stores events in memory and appends them to a backing file
pub struct EventLogger {
    file: File,
    entries: Vec<LogEntry>,
}

impl EventLogger {
    /// Create a logger appending to `path`; parent directories are created
    /// and the file is touched so the append log exists from startup.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, StationError> {
        let file = File::new(path);
        if !file.exists().await {
            file.write_string("").await?;
        }
        Ok(Self {
            file,
            entries: Vec::new(),
        })
    }

    /// Path of the backing append log
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Entries recorded so far, in order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Record an event.
    ///
    /// The JSON line is flushed to the backing file first; when that fails
    /// the in-memory list is left unchanged and the error is returned.
    pub async fn log_event(
        &mut self,
        event_type: &str,
        message: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<(), StationError> {
        let entry = LogEntry {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            event_type: event_type.to_string(),
            message: message.to_string(),
            metadata,
        };
        let line = serde_json::to_string(&entry)?;
        self.file.append_line(&line).await?;
        self.entries.push(entry);
        Ok(())
    }

    /// Write all entries to `path` as a JSON array
    pub async fn save_json(&self, path: &Path) -> Result<(), StationError> {
        File::new(path).write_json(&self.entries).await
    }

    /// Replace the in-memory list with the contents of a JSON array file.
    ///
    /// A missing or malformed file yields an empty list.
    pub async fn load_json(&mut self, path: &Path) {
        self.entries = match File::new(path).read_json::<Vec<LogEntry>>().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding unreadable event log {}: {}", path.display(), e);
                Vec::new()
            }
        };
    }

    /// Write all entries to `path` as CSV with header
    /// `timestamp,event_type,message,metadata`.
    pub async fn save_csv(&self, path: &Path) -> Result<(), StationError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for entry in &self.entries {
            let metadata = match &entry.metadata {
                Some(map) => serde_json::to_string(map)?,
                None => String::new(),
            };
            writer.serialize(CsvRow {
                timestamp: entry.timestamp.clone(),
                event_type: entry.event_type.clone(),
                message: entry.message.clone(),
                metadata,
            })?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let contents = String::from_utf8(data)
            .map_err(|e| StationError::Validation(format!("csv output is not utf-8: {}", e)))?;
        File::new(path).write_string(&contents).await
    }

    /// Replace the in-memory list with the contents of a CSV file.
    ///
    /// A missing or malformed file yields an empty list.
    pub async fn load_csv(&mut self, path: &Path) {
        self.entries = match self.read_csv(path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding unreadable event log {}: {}", path.display(), e);
                Vec::new()
            }
        };
    }

    async fn read_csv(&self, path: &Path) -> Result<Vec<LogEntry>, StationError> {
        let contents = File::new(path).read_string().await?;
        let mut reader = csv::Reader::from_reader(contents.as_bytes());
        let mut entries = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row?;
            let metadata = if row.metadata.is_empty() {
                None
            } else {
                serde_json::from_str(&row.metadata)?
            };
            entries.push(LogEntry {
                timestamp: row.timestamp,
                event_type: row.event_type,
                message: row.message,
                metadata,
            });
        }
        Ok(entries)
    }
}
