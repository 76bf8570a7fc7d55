//! Due-soon alerts and the merged notification feed.
//!
//! Alerts are synthesised on every read from the open tasks due today or
//! tomorrow. They are never written to the notification log.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::db::{format_display, format_timestamp, parse_due};
use crate::notify::{iso_timestamp, Notification};
use crate::task::Task;

/// A transient "due soon" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueAlert {
    pub ts: String,
    pub kind: &'static str,
    pub message: String,
    pub due: String,
}

pub const DUE_KIND: &str = "due";

/// Alerts for open tasks due today or tomorrow, in task order.
///
/// `today` is the local date the due dates are compared against; `stamped_at`
/// is the UTC time written into `ts`, the same basis as persisted notifications.
pub fn due_soon_alerts(tasks: &[Task], today: NaiveDate, stamped_at: NaiveDateTime) -> Vec<DueAlert> {
    tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter_map(|t| {
            let raw = t.due_date.as_deref().filter(|s| !s.is_empty())?;
            let due = parse_due(raw)?;
            let prefix = due_prefix(due, today)?;
            Some(DueAlert {
                ts: iso_timestamp(stamped_at),
                kind: DUE_KIND,
                message: format!("{prefix}: {}", t.title),
                due: raw.to_string(),
            })
        })
        .collect()
}

fn due_prefix(due: NaiveDate, today: NaiveDate) -> Option<&'static str> {
    match (due - today).num_days() {
        0 => Some("Due Today"),
        1 => Some("Due Tomorrow"),
        _ => None,
    }
}

/// One line of the notifications view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeedItem {
    Alert(DueAlert),
    Event(Notification),
}

impl FeedItem {
    pub fn ts(&self) -> &str {
        match self {
            FeedItem::Alert(a) => &a.ts,
            FeedItem::Event(n) => &n.ts,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FeedItem::Alert(a) => &a.message,
            FeedItem::Event(n) => &n.message,
        }
    }

    pub fn kind_label(&self) -> String {
        match self {
            FeedItem::Alert(a) => a.kind.to_string(),
            FeedItem::Event(n) => serde_json::to_value(n.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        }
    }
}

/// A feed item together with its display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub item: FeedItem,
    pub ts_display: String,
    pub due_display: String,
}

impl FeedEntry {
    fn new(item: FeedItem) -> Self {
        let due_display = match &item {
            FeedItem::Alert(a) => format_display(Some(a.due.as_str())),
            FeedItem::Event(_) => String::new(),
        };
        FeedEntry {
            ts_display: format_timestamp(item.ts()),
            due_display,
            item,
        }
    }
}

/// The notifications view: alerts newest first, then persisted events newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationFeed {
    pub entries: Vec<FeedEntry>,
    /// Number of persisted notifications.
    pub unread: usize,
}

pub fn build_feed(alerts: Vec<DueAlert>, notes: Vec<Notification>) -> NotificationFeed {
    let unread = notes.len();
    let entries = alerts
        .into_iter()
        .rev()
        .map(FeedItem::Alert)
        .chain(notes.into_iter().rev().map(FeedItem::Event))
        .map(FeedEntry::new)
        .collect();
    NotificationFeed { entries, unread }
}
