//! Derived task views for the dashboard and the task list.
//!
//! Everything here is pure: given the raw tasks, a query and today's date it
//! decorates each task with display fields, selects and orders the visible
//! subset, and computes the aggregate counts over the whole collection.
//! Bad dates and bad priorities degrade to "no value" and never fail a view.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::db::{format_display, parse_due};
use crate::fields::{SortKey, SortOrder, ViewFilter, DEFAULT_PRIORITY};
use crate::task::Task;

/// Query parameters accepted by the view-producing operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: ViewFilter,
    /// Exact-match `due_date` selector.
    pub date: Option<String>,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
}

/// Relative due-date label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueLabel {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    /// More than a week out; shown as month and day.
    Later(NaiveDate),
}

impl DueLabel {
    pub fn from_delta(due: NaiveDate, today: NaiveDate) -> Self {
        match (due - today).num_days() {
            d if d < 0 => DueLabel::Overdue,
            0 => DueLabel::Today,
            1 => DueLabel::Tomorrow,
            2..=7 => DueLabel::ThisWeek,
            _ => DueLabel::Later(due),
        }
    }
}

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueLabel::Overdue => f.write_str("Overdue"),
            DueLabel::Today => f.write_str("Today"),
            DueLabel::Tomorrow => f.write_str("Tomorrow"),
            DueLabel::ThisWeek => f.write_str("This week"),
            DueLabel::Later(d) => write!(f, "{}", d.format("%b %d")),
        }
    }
}

impl Serialize for DueLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A task plus the fields the presentation layer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub task: Task,
    pub completed: bool,
    pub due_label: Option<DueLabel>,
    pub due_display: String,
    pub created_display: String,
}

impl TaskRow {
    pub fn new(task: &Task, today: NaiveDate) -> Self {
        let due_label = due_date_of(task).map(|due| DueLabel::from_delta(due, today));
        TaskRow {
            completed: task.is_completed(),
            due_label,
            due_display: format_display(task.due_date.as_deref()),
            created_display: format_display(Some(task.created_at.as_str())),
            task: task.clone(),
        }
    }
}

/// Per-bucket counts shown next to the filter selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub high: usize,
}

impl FilterCounts {
    pub fn get(&self, filter: ViewFilter) -> usize {
        match filter {
            ViewFilter::All => self.all,
            ViewFilter::Pending => self.pending,
            ViewFilter::Completed => self.completed,
            ViewFilter::High => self.high,
        }
    }
}

/// Aggregates over the unfiltered collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Zero when any task's priority cannot be coerced.
    pub high_priority: usize,
    pub filters: FilterCounts,
    pub categories: BTreeMap<String, usize>,
}

/// Everything the dashboard and task list render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub query: QueryEcho,
    /// Every task, decorated, in store order.
    pub tasks: Vec<TaskRow>,
    /// The filtered and sorted subset.
    pub filtered: Vec<TaskRow>,
    pub counts: TaskCounts,
}

/// The query as applied, echoed back for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEcho {
    pub filter: ViewFilter,
    pub date: Option<String>,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
}

impl From<&ViewQuery> for QueryEcho {
    fn from(q: &ViewQuery) -> Self {
        QueryEcho {
            filter: q.filter,
            date: q.date.clone(),
            sort: q.sort,
            order: q.order,
        }
    }
}

/// Build the full view for `tasks` as of `today`.
pub fn build_view(tasks: &[Task], query: &ViewQuery, today: NaiveDate) -> DashboardView {
    let rows: Vec<TaskRow> = tasks.iter().map(|t| TaskRow::new(t, today)).collect();

    let mut filtered: Vec<TaskRow> = rows
        .iter()
        .filter(|row| matches_filter(&row.task, query.filter))
        .filter(|row| match query.date.as_deref() {
            Some(date) => row.task.due_date.as_deref() == Some(date),
            None => true,
        })
        .cloned()
        .collect();

    if let Some(key) = query.sort {
        sort_rows(&mut filtered, key, query.order);
    }

    DashboardView {
        query: QueryEcho::from(query),
        counts: count_tasks(tasks),
        tasks: rows,
        filtered,
    }
}

pub fn matches_filter(task: &Task, filter: ViewFilter) -> bool {
    match filter {
        ViewFilter::All => true,
        ViewFilter::Pending => !task.is_completed(),
        ViewFilter::Completed => task.is_completed(),
        ViewFilter::High => task.is_high_priority(),
    }
}

/// Stable in-place sort. Tasks without a usable due date stay after the
/// dated ones in both directions.
pub fn sort_rows(rows: &mut [TaskRow], key: SortKey, order: SortOrder) {
    match key {
        SortKey::Due => rows.sort_by(|a, b| {
            compare_due(due_date_of(&a.task), due_date_of(&b.task), order)
        }),
        SortKey::Priority => rows.sort_by(|a, b| {
            directed(sort_priority(&a.task).cmp(&sort_priority(&b.task)), order)
        }),
    }
}

fn compare_due(a: Option<NaiveDate>, b: Option<NaiveDate>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(x.cmp(&y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn directed(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn sort_priority(task: &Task) -> i64 {
    task.priority_level().unwrap_or(DEFAULT_PRIORITY)
}

fn due_date_of(task: &Task) -> Option<NaiveDate> {
    task.due_date.as_deref().and_then(parse_due)
}

/// Aggregate counts over the whole collection.
pub fn count_tasks(tasks: &[Task]) -> TaskCounts {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    let high = tasks.iter().filter(|t| t.is_high_priority()).count();

    let any_bad_priority = tasks.iter().any(|t| t.priority_level().is_none());
    if any_bad_priority {
        tracing::debug!("unparseable priority present, headline high-priority count is 0");
    }

    let mut categories = BTreeMap::new();
    for cat in tasks.iter().filter_map(Task::category_key) {
        *categories.entry(cat.to_string()).or_insert(0) += 1;
    }

    TaskCounts {
        total,
        completed,
        pending: total - completed,
        high_priority: if any_bad_priority { 0 } else { high },
        filters: FilterCounts {
            all: total,
            pending: total - completed,
            completed,
            high,
        },
        categories,
    }
}
