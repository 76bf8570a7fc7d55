//! Persistence for the task file and shared date utilities.
//!
//! Both the task file and the notification log are a single JSON array on
//! disk. Reads degrade to an empty collection when the file is missing,
//! empty or unparseable; writes go to a temp file in the same directory and
//! are renamed over the real file so readers never see a partial document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{TaskError, TaskResult};
use crate::task::Task;

/// Durable, ordered collection of tasks.
///
/// `read_all` never fails: a missing or damaged backing store reads as
/// empty so the dashboard stays renderable. `replace_all` swaps the whole
/// collection in one step.
pub trait TaskStore {
    fn read_all(&self) -> Vec<Task>;
    fn replace_all(&self, tasks: &[Task]) -> TaskResult<()>;
}

/// Task store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskStore for JsonTaskStore {
    fn read_all(&self) -> Vec<Task> {
        read_collection(&self.path)
    }

    fn replace_all(&self, tasks: &[Task]) -> TaskResult<()> {
        write_collection(&self.path, tasks)
    }
}

/// Create the parent directory and an empty `[]` document if the file is absent.
pub fn ensure_collection_file(path: &Path) -> TaskResult<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    write_collection::<serde_json::Value>(path, &[])
}

/// Read a JSON array of records, degrading to empty when the file is
/// missing or is not a JSON array. Records that do not decode are skipped
/// one at a time so a single bad entry cannot hide the rest.
pub fn read_collection<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    if let Err(e) = ensure_collection_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not initialise data file");
    }
    let buf = match fs::read_to_string(path) {
        Ok(buf) => buf,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "error reading data file, treating as empty");
            return Vec::new();
        }
    };
    if buf.trim().is_empty() {
        return Vec::new();
    }
    let raw: Vec<serde_json::Value> = match serde_json::from_str(&buf) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "error parsing data file, treating as empty");
            return Vec::new();
        }
    };
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(path = %path.display(), index, error = %e, "skipping unreadable record");
                None
            }
        })
        .collect()
}

/// Atomically replace the file with `items` (temp file + rename).
///
/// The temp file is removed on every failure path when it is dropped;
/// a failed removal is ignored.
pub fn write_collection<T: Serialize>(path: &Path, items: &[T]) -> TaskResult<()> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.to_path_buf()
        }
        None => PathBuf::from("."),
    };
    let data = serde_json::to_string_pretty(items)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(data.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| TaskError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;
    tracing::debug!(path = %path.display(), records = items.len(), "data file replaced");
    Ok(())
}

/// Parse an ISO-8601 date or date-time.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS[.f]]` (or with a space
/// instead of `T`) and RFC 3339 with an offset, whose wall-clock time is kept.
pub fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Calendar date of an ISO date or date-time string.
pub fn parse_due(s: &str) -> Option<NaiveDate> {
    parse_iso(s).map(|dt| dt.date())
}

/// Display form of a stored date: `DD-MM-YYYY` for plain dates,
/// `DD-MM-YYYY HH:MM:SS` for timestamps. Unparseable input passes through.
pub fn format_display(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match parse_iso(raw) {
        Some(dt) if !raw.contains('T') && dt.num_seconds_from_midnight() == 0 => {
            dt.format("%d-%m-%Y").to_string()
        }
        Some(dt) => dt.format("%d-%m-%Y %H:%M:%S").to_string(),
        None => raw.to_string(),
    }
}

/// Display form of an event timestamp, always with the time of day.
pub fn format_timestamp(raw: &str) -> String {
    parse_iso(raw)
        .map(|dt| dt.format("%d-%m-%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::sample;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonTaskStore {
        JsonTaskStore::new(dir.path().join("data").join("tasks.json"))
    }

    #[test]
    fn test_missing_file_reads_empty_and_is_created() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.read_all().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap().trim(), "[]");
    }

    #[test]
    fn test_empty_and_corrupt_files_read_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        fs::write(store.path(), "").unwrap();
        assert!(store.read_all().is_empty());

        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.read_all().is_empty());

        fs::write(store.path(), r#"{"id": "not-an-array"}"#).unwrap();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn test_null_fields_and_bad_records_do_not_hide_the_rest() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"[
                {"id": "a", "title": "Keep me", "description": null, "category": null},
                {"id": "b", "title": null, "status": null, "created_at": null},
                {"title": "No id"},
                42,
                {"id": "c", "title": "Also kept", "completed": "yes"},
                {"id": "d", "title": "Last"}
            ]"#,
        )
        .unwrap();

        let tasks = store.read_all();
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "", "d"]);
        assert_eq!(tasks[0].description, "");
        assert_eq!(tasks[0].category, "");
        assert_eq!(tasks[1].title, "");
        assert_eq!(tasks[1].status, "Pending");
        assert_eq!(tasks[1].created_at, "");
        assert_eq!(tasks[2].title, "No id");
    }

    #[test]
    fn test_persist_error_names_the_destination() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data");
        fs::create_dir_all(target.join("occupied")).unwrap();
        let err = write_collection::<serde_json::Value>(&target, &[]).unwrap_err();
        match err {
            TaskError::Persist { path, .. } => assert_eq!(path, target.display().to_string()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_replace_then_read_preserves_order_and_values() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut b = sample("b", "Second");
        b.due_date = Some("2025-03-01".into());
        b.completed = Some(true);
        let tasks = vec![sample("c", "First"), b, sample("a", "Third")];

        store.replace_all(&tasks).unwrap();
        assert_eq!(store.read_all(), tasks);

        // A fresh handle over the same path sees the same data.
        let reopened = JsonTaskStore::new(store.path());
        assert_eq!(reopened.read_all(), tasks);
    }

    #[test]
    fn test_replace_leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.replace_all(&[sample("a", "x")]).unwrap();
        store.replace_all(&[sample("b", "y")]).unwrap();
        let names: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["tasks.json".to_string()]);
    }

    #[test]
    fn test_failed_replace_keeps_previous_contents() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.replace_all(&[sample("a", "x")]).unwrap();
        let before = fs::read(store.path()).unwrap();

        // A directory where the file should be makes the rename fail.
        let blocked = JsonTaskStore::new(dir.path().join("data"));
        assert!(blocked.replace_all(&[sample("b", "y")]).is_err());
        assert_eq!(fs::read(store.path()).unwrap(), before);
        let leftovers = fs::read_dir(store.path().parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_parse_iso_variants() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(parse_due("2025-03-05"), Some(d));
        assert_eq!(parse_due("2025-03-05T14:30:00"), Some(d));
        assert_eq!(parse_due("2025-03-05T14:30:00.123456"), Some(d));
        assert_eq!(parse_due("2025-03-05 14:30"), Some(d));
        assert_eq!(parse_due("2025-03-05T23:30:00+02:00"), Some(d));
        assert_eq!(parse_due("next tuesday"), None);
        assert_eq!(parse_due(""), None);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format_display(Some("2025-03-05")), "05-03-2025");
        assert_eq!(format_display(Some("2025-03-05T14:30:09")), "05-03-2025 14:30:09");
        assert_eq!(format_display(Some("2025-03-05T00:00:00")), "05-03-2025 00:00:00");
        assert_eq!(format_display(Some("2025-03-05 00:00:00")), "05-03-2025");
        assert_eq!(format_display(Some("soon")), "soon");
        assert_eq!(format_display(Some("")), "");
        assert_eq!(format_display(None), "");
    }

    #[test]
    fn test_format_timestamp_always_has_time() {
        assert_eq!(format_timestamp("2025-12-31T12:00:00.250000"), "31-12-2025 12:00:00");
        assert_eq!(format_timestamp("2025-12-31"), "31-12-2025 00:00:00");
        assert_eq!(format_timestamp("garbage"), "garbage");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
