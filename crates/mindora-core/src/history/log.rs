//! Append-only completion log.
//!
//! The whole log is one JSON array under a single store key, independent of
//! any live session snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// Default store key for the completion log.
pub const DEFAULT_LOG_KEY: &str = "mindora_breath_logs";

/// One finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: u32,
    pub session_type: String,
}

impl LogEntry {
    pub fn new(session_type: impl Into<String>, duration_seconds: u32) -> Self {
        Self::at(session_type, duration_seconds, Utc::now())
    }

    pub fn at(session_type: impl Into<String>, duration_seconds: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            duration_seconds,
            session_type: session_type.into(),
        }
    }
}

/// Per-exercise totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_type: String,
    pub sessions: u64,
    pub total_seconds: u64,
    pub last_completed_at: DateTime<Utc>,
}

pub struct CompletionLog<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> CompletionLog<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// All entries in append order. A malformed payload reads as empty.
    pub fn entries(&self) -> Result<Vec<LogEntry>, StorageError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "ignoring malformed completion log");
                Ok(Vec::new())
            }
        }
    }

    pub fn entries_for(&self, session_type: &str) -> Result<Vec<LogEntry>, StorageError> {
        let mut entries = self.entries()?;
        entries.retain(|e| e.session_type == session_type);
        Ok(entries)
    }

    pub fn append(&self, entry: LogEntry) -> Result<(), StorageError> {
        let mut entries = self.entries()?;
        entries.push(entry);
        let json = serde_json::to_string(&entries).map_err(|e| StorageError::Malformed {
            key: self.key.clone(),
            message: e.to_string(),
        })?;
        self.store.set(&self.key, &json)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }

    /// Totals grouped by session type, sorted by type.
    pub fn summary(&self) -> Result<Vec<SessionSummary>, StorageError> {
        let mut by_type: BTreeMap<String, SessionSummary> = BTreeMap::new();
        for entry in self.entries()? {
            let summary = by_type
                .entry(entry.session_type.clone())
                .or_insert_with(|| SessionSummary {
                    session_type: entry.session_type.clone(),
                    sessions: 0,
                    total_seconds: 0,
                    last_completed_at: entry.timestamp,
                });
            summary.sessions += 1;
            summary.total_seconds += u64::from(entry.duration_seconds);
            summary.last_completed_at = summary.last_completed_at.max(entry.timestamp);
        }
        Ok(by_type.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn append_preserves_order() {
        let store = MemoryStore::new();
        let log = CompletionLog::new(&store, DEFAULT_LOG_KEY);
        log.append(LogEntry::new("box", 80)).unwrap();
        log.append(LogEntry::new("calm", 76)).unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].session_type, "box");
        assert_eq!(entries[1].session_type, "calm");
    }

    #[test]
    fn malformed_log_reads_as_empty_and_is_replaced_on_append() {
        let store = MemoryStore::new();
        store.set(DEFAULT_LOG_KEY, "definitely not json").unwrap();
        let log = CompletionLog::new(&store, DEFAULT_LOG_KEY);
        assert!(log.entries().unwrap().is_empty());

        log.append(LogEntry::new("box", 80)).unwrap();
        assert_eq!(log.entries().unwrap().len(), 1);
    }

    #[test]
    fn entry_wire_format_is_camel_case() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let entry = LogEntry::at("coaching-box", 120, ts);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["durationSeconds"], 120);
        assert_eq!(json["sessionType"], "coaching-box");
        assert_eq!(json["timestamp"], "2025-03-01T08:30:00Z");
    }

    #[test]
    fn summary_groups_by_type() {
        let store = MemoryStore::new();
        let log = CompletionLog::new(&store, DEFAULT_LOG_KEY);
        let early = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap();
        log.append(LogEntry::at("box", 80, late)).unwrap();
        log.append(LogEntry::at("box", 80, early)).unwrap();
        log.append(LogEntry::at("calm", 76, early)).unwrap();

        let summary = log.summary().unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].session_type, "box");
        assert_eq!(summary[0].sessions, 2);
        assert_eq!(summary[0].total_seconds, 160);
        assert_eq!(summary[0].last_completed_at, late);
        assert_eq!(summary[1].sessions, 1);
    }

    #[test]
    fn entries_for_and_clear() {
        let store = MemoryStore::new();
        let log = CompletionLog::new(&store, "logs");
        log.append(LogEntry::new("box", 80)).unwrap();
        log.append(LogEntry::new("deep", 84)).unwrap();
        assert_eq!(log.entries_for("deep").unwrap().len(), 1);

        log.clear().unwrap();
        assert!(log.entries().unwrap().is_empty());
        assert!(!store.contains_key("logs"));
    }
}
