//! Enumerations and field types for the task dashboard.
//!
//! This module defines the small closed vocabularies used across the crate:
//! view filters, sort keys and directions, notification kinds, and the raw
//! priority value as it is found on disk.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Filter buckets offered by the dashboard and the task list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    #[default]
    All,
    Pending,
    Completed,
    High,
}

impl ViewFilter {
    pub const ALL: [ViewFilter; 4] = [
        ViewFilter::All,
        ViewFilter::Pending,
        ViewFilter::Completed,
        ViewFilter::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::Pending => "pending",
            ViewFilter::Completed => "completed",
            ViewFilter::High => "high",
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Due,
    Priority,
}

/// Sort direction. Defaults to ascending.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Kind tag on a persisted notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Create,
    Update,
    Delete,
    /// Also absorbs unrecognised tags found in an existing log.
    #[serde(other)]
    Info,
}

/// Priority exactly as stored in the task file.
///
/// Files written by hand or by older versions may hold the priority as a
/// number, a numeric string, or something else entirely, so the value is
/// kept verbatim and only coerced when a number is needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PriorityValue {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

pub const DEFAULT_PRIORITY: i64 = 3;
pub const HIGH_PRIORITY_THRESHOLD: i64 = 4;

impl Default for PriorityValue {
    fn default() -> Self {
        PriorityValue::Int(DEFAULT_PRIORITY)
    }
}

impl PriorityValue {
    /// Integer priority, or `None` when the stored value cannot be coerced.
    pub fn level(&self) -> Option<i64> {
        match self {
            PriorityValue::Int(n) => Some(*n),
            PriorityValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            PriorityValue::Float(_) => None,
            PriorityValue::Text(s) => s.trim().parse::<i64>().ok(),
            PriorityValue::Other(_) => None,
        }
    }

    /// Coerce an arbitrary JSON value the way the update path does.
    pub fn coerce(value: &serde_json::Value) -> Option<i64> {
        serde_json::from_value::<PriorityValue>(value.clone())
            .ok()
            .and_then(|p| p.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_level_coercion() {
        assert_eq!(PriorityValue::Int(5).level(), Some(5));
        assert_eq!(PriorityValue::Float(4.9).level(), Some(4));
        assert_eq!(PriorityValue::Text(" 4 ".into()).level(), Some(4));
        assert_eq!(PriorityValue::Text("4.5".into()).level(), None);
        assert_eq!(PriorityValue::Text("urgent".into()).level(), None);
        assert_eq!(PriorityValue::Other(json!(null)).level(), None);
        assert_eq!(PriorityValue::Other(json!(true)).level(), None);
    }

    #[test]
    fn test_priority_value_deserialises_any_scalar() {
        let p: PriorityValue = serde_json::from_value(json!(2)).unwrap();
        assert_eq!(p, PriorityValue::Int(2));
        let p: PriorityValue = serde_json::from_value(json!("5")).unwrap();
        assert_eq!(p.level(), Some(5));
        let p: PriorityValue = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(p.level(), None);
    }

    #[test]
    fn test_unknown_notification_kind_reads_as_info() {
        let k: NotificationKind = serde_json::from_value(json!("warning")).unwrap();
        assert_eq!(k, NotificationKind::Info);
        let k: NotificationKind = serde_json::from_value(json!("delete")).unwrap();
        assert_eq!(k, NotificationKind::Delete);
        assert_eq!(serde_json::to_value(NotificationKind::Create).unwrap(), json!("create"));
    }

    #[test]
    fn test_sort_order_toggle() {
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }
}
