//! Append-only notification log.
//!
//! Events are kept oldest first in their own JSON file. Appends rewrite the
//! whole file through the same atomic replace as the task store.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{read_collection, write_collection};
use crate::error::TaskResult;
use crate::fields::NotificationKind;

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub ts: String,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NotificationLog {
    path: PathBuf,
}

impl NotificationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_all(&self) -> Vec<Notification> {
        read_collection(&self.path)
    }

    pub fn append(&self, message: impl Into<String>, kind: NotificationKind) -> TaskResult<()> {
        self.append_at(message, kind, Utc::now().naive_utc())
    }

    pub fn append_at(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        at: NaiveDateTime,
    ) -> TaskResult<()> {
        let mut notes = self.read_all();
        notes.push(Notification {
            ts: iso_timestamp(at),
            kind,
            message: message.into(),
        });
        write_collection(&self.path, &notes)
    }

    pub fn clear(&self) -> TaskResult<()> {
        write_collection::<Notification>(&self.path, &[])?;
        tracing::info!(path = %self.path.display(), "notifications cleared");
        Ok(())
    }

    /// Number of persisted notifications.
    pub fn unread_count(&self) -> usize {
        self.read_all().len()
    }
}

/// `YYYY-MM-DDTHH:MM:SS.ffffff`
pub fn iso_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_append_keeps_oldest_first() {
        let dir = TempDir::new().unwrap();
        let log = NotificationLog::new(dir.path().join("notifications.json"));
        log.append_at("first", NotificationKind::Create, at(9, 0)).unwrap();
        log.append_at("second", NotificationKind::Delete, at(10, 30)).unwrap();

        let notes = log.read_all();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].message, "first");
        assert_eq!(notes[0].ts, "2025-12-31T09:00:00.000000");
        assert_eq!(notes[1].kind, NotificationKind::Delete);
        assert_eq!(log.unread_count(), 2);
    }

    #[test]
    fn test_clear_empties_log() {
        let dir = TempDir::new().unwrap();
        let log = NotificationLog::new(dir.path().join("notifications.json"));
        log.append("hello", NotificationKind::Info).unwrap();
        log.clear().unwrap();
        assert!(log.read_all().is_empty());
        assert_eq!(std::fs::read_to_string(log.path()).unwrap().trim(), "[]");
    }

    #[test]
    fn test_corrupt_log_reads_empty_and_append_recovers() {
        let dir = TempDir::new().unwrap();
        let log = NotificationLog::new(dir.path().join("notifications.json"));
        std::fs::write(log.path(), "[{").unwrap();
        assert!(log.read_all().is_empty());
        log.append("fresh start", NotificationKind::Info).unwrap();
        assert_eq!(log.read_all().len(), 1);
    }

    #[test]
    fn test_append_to_unwritable_location_errors() {
        let dir = TempDir::new().unwrap();
        // The log path is an existing directory, so it can be neither read nor replaced.
        let log = NotificationLog::new(dir.path());
        assert!(log.append("x", NotificationKind::Info).is_err());
    }
}
