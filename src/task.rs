//! Task data structure and related functionality.
//!
//! This module defines the `Task` record as it is stored in the task file,
//! along with the derived completion predicate every view agrees on.

use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::{PriorityValue, HIGH_PRIORITY_THRESHOLD};

pub const DEFAULT_STATUS: &str = "Pending";

/// Status tokens (compared case-insensitively) that count as finished.
const DONE_STATUSES: [&str; 2] = ["done", "completed"];

/// A single work item.
///
/// Completion is recorded in two places for compatibility with existing
/// files: the optional `completed` flag and the free-form `status`. Neither
/// is authoritative on its own; use [`Task::is_completed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub priority: PriorityValue,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default = "default_status", deserialize_with = "null_as_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    /// Keys this version does not know about, kept so hand-edited files round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Older files store `null` for cleared text fields.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_status))
}

impl Task {
    /// Effective completion: the flag is set, or the status reads as done.
    pub fn is_completed(&self) -> bool {
        self.completed == Some(true) || status_means_done(&self.status)
    }

    /// Integer priority, `None` if the stored value cannot be coerced.
    pub fn priority_level(&self) -> Option<i64> {
        self.priority.level()
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority_level()
            .is_some_and(|p| p >= HIGH_PRIORITY_THRESHOLD)
    }

    /// Trimmed category, `None` when blank.
    pub fn category_key(&self) -> Option<&str> {
        let cat = self.category.trim();
        (!cat.is_empty()).then_some(cat)
    }
}

pub fn status_means_done(status: &str) -> bool {
    let status = status.to_lowercase();
    DONE_STATUSES.contains(&status.as_str())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Minimal task for tests in this and other modules.
    pub(crate) fn sample(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            priority: PriorityValue::default(),
            due_date: None,
            status: DEFAULT_STATUS.to_string(),
            completed: None,
            category: String::new(),
            created_at: "2025-01-01".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_effective_completion_truth_table() {
        let mut t = sample("1", "a");
        assert!(!t.is_completed());

        t.status = "DONE".into();
        assert!(t.is_completed());
        t.status = "Completed".into();
        assert!(t.is_completed());
        t.status = "in progress".into();
        assert!(!t.is_completed());

        t.completed = Some(true);
        assert!(t.is_completed());
        t.completed = Some(false);
        t.status = "done".into();
        assert!(t.is_completed());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let t: Task = serde_json::from_value(json!({"id": "x", "title": "Write report"})).unwrap();
        assert_eq!(t.status, "Pending");
        assert_eq!(t.priority_level(), Some(3));
        assert_eq!(t.due_date, None);
        assert_eq!(t.completed, None);
        assert!(t.description.is_empty());
    }

    #[test]
    fn test_null_text_fields_read_as_defaults() {
        let t: Task = serde_json::from_value(json!({
            "id": null,
            "title": null,
            "description": null,
            "status": null,
            "category": null,
            "created_at": null
        }))
        .unwrap();
        assert_eq!(t.id, "");
        assert_eq!(t.title, "");
        assert_eq!(t.description, "");
        assert_eq!(t.status, "Pending");
        assert_eq!(t.category, "");
        assert_eq!(t.created_at, "");
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = json!({
            "id": "x",
            "title": "t",
            "priority": "5",
            "status": "Pending",
            "category": "Work",
            "created_at": "2025-01-01",
            "due_date": null,
            "description": "",
            "owner": "sam"
        });
        let t: Task = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(t.extra.get("owner"), Some(&json!("sam")));
        assert!(t.is_high_priority());
        assert_eq!(serde_json::to_value(&t).unwrap(), raw);
    }

    #[test]
    fn test_category_key_trims_and_skips_blank() {
        let mut t = sample("1", "a");
        assert_eq!(t.category_key(), None);
        t.category = "   ".into();
        assert_eq!(t.category_key(), None);
        t.category = " Work ".into();
        assert_eq!(t.category_key(), Some("Work"));
    }
}
