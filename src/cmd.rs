//! Command implementations for the CLI interface.
//!
//! Each subcommand maps onto one operation of the task service. Commands
//! that mirror the JSON API print JSON on stdout; the dashboard, task list
//! and notifications commands print an aligned table unless `--json` is given.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::alerts::NotificationFeed;
use crate::config::Config;
use crate::db::{truncate, JsonTaskStore};
use crate::error::{TaskError, TaskResult};
use crate::fields::*;
use crate::notify::NotificationLog;
use crate::service::{NewTask, TaskPatch, TaskService};
use crate::tui::run::run_tui;
use crate::view::{DashboardView, ViewQuery};

#[derive(Subcommand)]
pub enum Commands {
    /// Print every task as JSON.
    List,

    /// Add a new task.
    Add {
        /// Short title for the task (required).
        #[arg(long)]
        title: Option<String>,
        /// Longer description.
        #[arg(long)]
        description: Option<String>,
        /// Priority, usually 1-5 (default 3).
        #[arg(long)]
        priority: Option<String>,
        /// Due date: YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        /// Free-form status (default "Pending").
        #[arg(long)]
        status: Option<String>,
        /// Category used for grouping.
        #[arg(long)]
        category: Option<String>,
        /// Create the task already completed.
        #[arg(long)]
        completed: bool,
        /// Task fields as a JSON object instead of flags.
        #[arg(long, conflicts_with_all = ["title", "description", "priority", "due", "status", "category", "completed"])]
        json: Option<String>,
    },

    /// Update fields on a task. Only the given fields change.
    Update {
        /// Task ID.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Ignored if it is not a whole number.
        #[arg(long)]
        priority: Option<String>,
        /// New due date; an empty string clears it.
        #[arg(long)]
        due: Option<String>,
        /// Clear the due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Set the completed flag: true | false.
        #[arg(long)]
        completed: Option<bool>,
        /// Fields as a JSON object instead of flags.
        #[arg(long, conflicts_with_all = ["title", "description", "priority", "due", "clear_due", "status", "category", "completed"])]
        json: Option<String>,
    },

    /// Mark a task done.
    Done {
        /// Task ID.
        id: String,
    },

    /// Reopen a task (status Pending).
    Reopen {
        /// Task ID.
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID.
        id: String,
    },

    /// Dashboard view: counts plus the filtered and sorted task list.
    Dashboard {
        #[arg(long, value_enum, default_value_t = ViewFilter::All)]
        filter: ViewFilter,
        /// Only tasks due on this exact date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,
        /// Print the view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Task list view (the dashboard without the date selector).
    Tasks {
        #[arg(long, value_enum, default_value_t = ViewFilter::All)]
        filter: ViewFilter,
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,
        #[arg(long)]
        json: bool,
    },

    /// Show due-soon alerts and recorded events.
    Notifications {
        #[command(subcommand)]
        action: Option<NotifyAction>,
        #[arg(long)]
        json: bool,
    },

    /// Launch the interactive dashboard.
    Ui,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Remove every recorded notification.
    Clear,
}

pub type Service = TaskService<JsonTaskStore>;

/// Build the service over the configured files.
pub fn open_service(config: &Config) -> Service {
    TaskService::new(
        JsonTaskStore::new(&config.tasks_path),
        NotificationLog::new(&config.notifications_path),
    )
}

/// Dispatch one parsed command.
pub fn run_command(command: Commands, config: &Config) -> TaskResult<()> {
    let svc = open_service(config);
    match command {
        Commands::List => print_json(&svc.list()),

        Commands::Add { title, description, priority, due, status, category, completed, json } => {
            let fields = match json {
                Some(body) => parse_body::<NewTask>(&body)?,
                None => NewTask {
                    title,
                    description,
                    priority: priority.map(serde_json::Value::String),
                    due_date: due,
                    status,
                    category,
                    completed: Some(completed),
                },
            };
            cmd_add(&svc, fields)
        }

        Commands::Update {
            id, title, description, priority, due, clear_due, status, category, completed, json,
        } => {
            let from_json = json.is_some();
            let patch = match json {
                Some(body) => parse_body::<TaskPatch>(&body)?,
                None => TaskPatch {
                    title,
                    description,
                    priority: priority.map(serde_json::Value::String),
                    due_date: if clear_due { Some(None) } else { due.map(Some) },
                    status,
                    category,
                    completed,
                },
            };
            if patch.is_empty() && !from_json {
                return Err(TaskError::Validation("nothing to update; pass at least one field".into()));
            }
            cmd_update(&svc, &id, patch)
        }

        Commands::Done { id } => print_json(&svc.set_completed(&id, true)?),

        Commands::Reopen { id } => print_json(&svc.set_completed(&id, false)?),

        Commands::Delete { id } => {
            svc.delete(&id)?;
            Ok(())
        }

        Commands::Dashboard { filter, date, sort, order, json } => {
            let query = ViewQuery { filter, date, sort, order };
            cmd_view(&svc, &query, json)
        }

        Commands::Tasks { filter, sort, order, json } => {
            let query = ViewQuery { filter, date: None, sort, order };
            cmd_view(&svc, &query, json)
        }

        Commands::Notifications { action: Some(NotifyAction::Clear), .. } => {
            svc.clear_notifications()?;
            println!("Notifications cleared");
            Ok(())
        }

        Commands::Notifications { action: None, json } => {
            let feed = svc.feed();
            if json {
                print_json(&feed)
            } else {
                print_feed(&feed);
                Ok(())
            }
        }

        Commands::Ui => cmd_ui(svc),

        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Create a task and print it.
pub fn cmd_add(svc: &Service, fields: NewTask) -> TaskResult<()> {
    let task = svc.create(fields)?;
    print_json(&task)
}

/// Apply a partial update and print the result.
pub fn cmd_update(svc: &Service, id: &str, patch: TaskPatch) -> TaskResult<()> {
    let task = svc.update(id, patch)?;
    print_json(&task)
}

/// Print the dashboard or task-list view.
pub fn cmd_view(svc: &Service, query: &ViewQuery, json: bool) -> TaskResult<()> {
    let view = svc.view(query);
    let unread = svc.log().unread_count();
    if json {
        let mut value = serde_json::to_value(&view)?;
        value["unread_count"] = unread.into();
        return print_json(&value);
    }
    print_dashboard(&view, unread);
    Ok(())
}

/// Launch the terminal user interface.
pub fn cmd_ui(svc: Service) -> TaskResult<()> {
    run_tui(svc)?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> TaskResult<T> {
    serde_json::from_str(body).map_err(|e| TaskError::Validation(format!("invalid JSON body: {e}")))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> TaskResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print headline counts, filter buckets, categories and the visible rows.
pub fn print_dashboard(view: &DashboardView, unread: usize) {
    let c = &view.counts;
    println!(
        "Total {}  Completed {}  Pending {}  High priority {}  Notifications {}",
        c.total, c.completed, c.pending, c.high_priority, unread
    );

    let buckets: Vec<String> = ViewFilter::ALL
        .iter()
        .map(|f| {
            let label = format!("{} {}", f.as_str(), c.filters.get(*f));
            if *f == view.query.filter {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect();
    let sort = match view.query.sort {
        Some(SortKey::Due) => "due",
        Some(SortKey::Priority) => "priority",
        None => "-",
    };
    let order = match view.query.order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    };
    println!(
        "Filter: {}  Sort: {} {}  Date: {}",
        buckets.join("  "),
        sort,
        order,
        view.query.date.as_deref().unwrap_or("-")
    );

    if !c.categories.is_empty() {
        let cats: Vec<String> = c.categories.iter().map(|(k, n)| format!("{k} {n}")).collect();
        println!("Categories: {}", cats.join(", "));
    }
    println!();

    println!(
        "{:<36} {:<4} {:<11} {:<4} {:<10} {:<11} {:<12} {}",
        "ID", "Done", "Status", "Pri", "Due", "Due date", "Category", "Title"
    );
    for row in &view.filtered {
        let t = &row.task;
        let pri = t
            .priority_level()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".into());
        let label = row.due_label.map(|l| l.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<36} {:<4} {:<11} {:<4} {:<10} {:<11} {:<12} {}",
            t.id,
            if row.completed { "x" } else { "" },
            truncate(&t.status, 11),
            pri,
            label,
            if row.due_display.is_empty() { "-" } else { row.due_display.as_str() },
            truncate(&t.category, 12),
            t.title
        );
    }
    println!("{} of {} tasks shown", view.filtered.len(), c.total);
}

/// Print the merged notification feed, newest first.
pub fn print_feed(feed: &NotificationFeed) {
    if feed.entries.is_empty() {
        println!("No notifications");
        return;
    }
    for entry in &feed.entries {
        let due = if entry.due_display.is_empty() {
            String::new()
        } else {
            format!("  (due {})", entry.due_display)
        };
        println!(
            "{:<19}  {:<6}  {}{}",
            entry.ts_display,
            entry.item.kind_label(),
            entry.item.message(),
            due
        );
    }
    println!("{} recorded", feed.unread);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::{CommandFactory, Parser};
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dashboard_flags_parse() {
        let cli = Cli::try_parse_from([
            "taskdash", "dashboard", "--filter", "high", "--sort", "due", "--order", "desc",
            "--date", "2025-03-05",
        ])
        .unwrap();
        match cli.command {
            Commands::Dashboard { filter, date, sort, order, json } => {
                assert_eq!(filter, ViewFilter::High);
                assert_eq!(date.as_deref(), Some("2025-03-05"));
                assert_eq!(sort, Some(SortKey::Due));
                assert_eq!(order, SortOrder::Desc);
                assert!(!json);
            }
            _ => panic!("expected dashboard"),
        }
        assert!(Cli::try_parse_from(["taskdash", "dashboard", "--filter", "urgent"]).is_err());
    }

    #[test]
    fn test_add_takes_title_as_a_flag() {
        let cli = Cli::try_parse_from([
            "taskdash", "add", "--title", "Renew passport", "--priority", "5", "--due", "2025-04-01",
            "--category", "admin",
        ])
        .unwrap();
        match cli.command {
            Commands::Add { title, priority, category, .. } => {
                assert_eq!(title.as_deref(), Some("Renew passport"));
                assert_eq!(priority.as_deref(), Some("5"));
                assert_eq!(category.as_deref(), Some("admin"));
            }
            _ => panic!("expected add"),
        }
        assert!(Cli::try_parse_from(["taskdash", "add", "Renew passport"]).is_err());
    }

    #[test]
    fn test_add_flags_conflict_with_json_body() {
        let parsed = Cli::try_parse_from([
            "taskdash", "add", "--title", "x", "--json", r#"{"title":"y"}"#,
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_command_add_update_delete() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());

        let add = Commands::Add {
            title: Some("From the CLI".into()),
            description: None,
            priority: Some("5".into()),
            due: Some("2025-06-01".into()),
            status: None,
            category: Some("Work".into()),
            completed: false,
            json: None,
        };
        run_command(add, &config).unwrap();
        let svc = open_service(&config);
        let tasks = svc.list();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority_level(), Some(5));
        let id = tasks[0].id.clone();

        let update = Commands::Update {
            id: id.clone(),
            title: None,
            description: None,
            priority: None,
            due: None,
            clear_due: true,
            status: None,
            category: None,
            completed: None,
            json: None,
        };
        run_command(update, &config).unwrap();
        assert_eq!(svc.list()[0].due_date, None);

        run_command(Commands::Done { id: id.clone() }, &config).unwrap();
        assert!(svc.list()[0].is_completed());

        run_command(Commands::Delete { id: id.clone() }, &config).unwrap();
        assert!(svc.list().is_empty());

        let err = run_command(Commands::Delete { id }, &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(svc.log().read_all().len(), 4);
    }

    #[test]
    fn test_run_command_rejects_missing_title_and_bad_json() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let add = Commands::Add {
            title: None,
            description: None,
            priority: None,
            due: None,
            status: None,
            category: None,
            completed: false,
            json: None,
        };
        assert_eq!(run_command(add, &config).unwrap_err().exit_code(), 2);

        let add = Commands::Add {
            title: None,
            description: None,
            priority: None,
            due: None,
            status: None,
            category: None,
            completed: false,
            json: Some("{not json".into()),
        };
        assert!(matches!(run_command(add, &config), Err(TaskError::Validation(_))));
    }

    #[test]
    fn test_update_without_fields_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let update = Commands::Update {
            id: "anything".into(),
            title: None,
            description: None,
            priority: None,
            due: None,
            clear_due: false,
            status: None,
            category: None,
            completed: None,
            json: None,
        };
        assert_eq!(run_command(update, &config).unwrap_err().exit_code(), 2);
    }
}
