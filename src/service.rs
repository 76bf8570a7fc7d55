//! Task mutations and the read-side entry points used by the CLI and the TUI.
//!
//! Every create, update and delete rewrites the task store and then records
//! an event in the notification log. The event is best effort: if it cannot
//! be written the failure is logged and the mutation still succeeds.

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::alerts::{build_feed, due_soon_alerts, NotificationFeed};
use crate::db::TaskStore;
use crate::error::{TaskError, TaskResult};
use crate::fields::{NotificationKind, PriorityValue, DEFAULT_PRIORITY};
use crate::notify::NotificationLog;
use crate::task::{Task, DEFAULT_STATUS};
use crate::view::{build_view, DashboardView, ViewQuery};

/// Source of "now" for due labels, alerts and creation dates.
pub trait Clock {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// UTC time, used for timestamps shown next to persisted notifications.
    fn now_utc(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Host clock in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_utc(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<serde_json::Value>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

/// A partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Coerced to an integer; values that do not coerce are ignored.
    #[serde(default)]
    pub priority: Option<serde_json::Value>,
    /// `Some(None)` or `Some(Some(""))` clears the due date.
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.category.is_none()
            && self.completed.is_none()
    }

    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(raw) = self.priority {
            match PriorityValue::coerce(&raw) {
                Some(level) => task.priority = PriorityValue::Int(level),
                None => tracing::debug!(task = %task.id, value = %raw, "ignoring non-numeric priority"),
            }
        }
        if let Some(due) = self.due_date {
            task.due_date = due.filter(|d| !d.is_empty());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(completed) = self.completed {
            task.completed = Some(completed);
        }
    }
}

/// Mutation and query facade over a task store and a notification log.
pub struct TaskService<S: TaskStore> {
    store: S,
    log: NotificationLog,
    clock: Box<dyn Clock>,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S, log: NotificationLog) -> Self {
        Self::with_clock(store, log, Box::new(SystemClock))
    }

    pub fn with_clock(store: S, log: NotificationLog, clock: Box<dyn Clock>) -> Self {
        Self { store, log, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &NotificationLog {
        &self.log
    }

    pub fn list(&self) -> Vec<Task> {
        self.store.read_all()
    }

    pub fn view(&self, query: &ViewQuery) -> DashboardView {
        build_view(&self.store.read_all(), query, self.clock.today())
    }

    pub fn feed(&self) -> NotificationFeed {
        let alerts = due_soon_alerts(&self.store.read_all(), self.clock.today(), self.clock.now_utc());
        build_feed(alerts, self.log.read_all())
    }

    pub fn clear_notifications(&self) -> TaskResult<()> {
        self.log.clear()
    }

    pub fn create(&self, fields: NewTask) -> TaskResult<Task> {
        let title = fields
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TaskError::Validation("title is required".into()))?;

        let mut tasks = self.store.read_all();
        let priority = match fields.priority.as_ref() {
            Some(raw) => PriorityValue::coerce(raw).unwrap_or_else(|| {
                tracing::debug!(value = %raw, "non-numeric priority on create, using default");
                DEFAULT_PRIORITY
            }),
            None => DEFAULT_PRIORITY,
        };
        let task = Task {
            id: fresh_id(&tasks),
            title,
            description: fields.description.unwrap_or_default(),
            priority: PriorityValue::Int(priority),
            due_date: fields.due_date.filter(|d| !d.is_empty()),
            status: fields
                .status
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            completed: Some(fields.completed.unwrap_or(false)),
            category: fields.category.unwrap_or_default(),
            created_at: self.clock.today().format("%Y-%m-%d").to_string(),
            extra: serde_json::Map::new(),
        };
        tasks.push(task.clone());
        self.store.replace_all(&tasks)?;
        tracing::info!(task = %task.id, "task created");

        self.notify(
            format!("Task created: {} (id={})", task.title, task.id),
            NotificationKind::Create,
        );
        Ok(task)
    }

    pub fn update(&self, id: &str, patch: TaskPatch) -> TaskResult<Task> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(TaskError::Validation("title cannot be empty".into()));
        }
        let mut tasks = self.store.read_all();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        patch.apply(task);
        let updated = task.clone();
        self.store.replace_all(&tasks)?;
        tracing::info!(task = %updated.id, "task updated");

        self.notify(
            format!("Task updated: {} (id={})", updated.title, updated.id),
            NotificationKind::Update,
        );
        Ok(updated)
    }

    /// Mark a task finished or reopen it, keeping both completion fields in step.
    pub fn set_completed(&self, id: &str, done: bool) -> TaskResult<Task> {
        let patch = TaskPatch {
            status: Some(if done { "done" } else { DEFAULT_STATUS }.to_string()),
            completed: Some(done),
            ..TaskPatch::default()
        };
        self.update(id, patch)
    }

    pub fn delete(&self, id: &str) -> TaskResult<Task> {
        let mut tasks = self.store.read_all();
        let pos = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let removed = tasks.remove(pos);
        self.store.replace_all(&tasks)?;
        tracing::info!(task = %removed.id, "task deleted");

        let message = if removed.title.is_empty() {
            "Task deleted".to_string()
        } else {
            format!("Task deleted: {}", removed.title)
        };
        self.notify(message, NotificationKind::Delete);
        Ok(removed)
    }

    fn notify(&self, message: String, kind: NotificationKind) {
        if let Err(e) = self.log.append(message, kind) {
            tracing::warn!(error = %e, ?kind, "notification not recorded");
        }
    }
}

fn fresh_id(existing: &[Task]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if existing.iter().all(|t| t.id != id) {
            return id;
        }
    }
}
