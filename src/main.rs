//! # taskdash - Personal Task Dashboard
//!
//! A single-user task dashboard backed by two JSON files, with a scriptable
//! CLI and an interactive terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Filtered, Sorted Views**: all / pending / completed / high priority, sorted by due
//!   date or priority, optionally narrowed to a single due date
//! - **Due Labels**: every dated task is tagged Overdue, Today, Tomorrow, This week or its date
//! - **Due-Soon Alerts**: open tasks due today or tomorrow surface at the top of the feed
//! - **Notification Log**: every create, update and delete leaves an entry on disk
//! - **Local File Storage**: `tasks.json` and `notifications.json`, replaced atomically on write
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! taskdash add --title "Renew passport" --priority 5 --due 2025-04-01 --category admin
//!
//! # Pending tasks by due date
//! taskdash dashboard --filter pending --sort due
//!
//! # Mark one done
//! taskdash done <id>
//!
//! # Launch the TUI
//! taskdash ui
//! ```
//!
//! Data is stored in `~/.taskdash/` unless `--data-dir` or `TASKDASH_DIR` points elsewhere.
//! Log output goes to stderr; `-v` and `-vv` raise the level and `RUST_LOG` overrides it.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub mod alerts;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod notify;
pub mod service;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::{run_command, Commands};
use config::Config;

fn main() {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir.as_deref());

    if let Err(e) = config.ensure() {
        eprintln!("Failed to prepare data directory {}: {}", config.data_dir.display(), e);
        std::process::exit(e.exit_code());
    }

    // The TUI owns the terminal, so its logs go to a file in the data directory.
    let log_file = match cli.command {
        Commands::Ui => match OpenOptions::new().create(true).append(true).open(config.log_path()) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", config.log_path().display(), e);
                None
            }
        },
        _ => None,
    };
    if let Err(e) = init_tracing(cli.verbose, cli.log_json, log_file) {
        eprintln!("Failed to initialise logging: {e}");
    }

    tracing::debug!(data_dir = %config.data_dir.display(), "resolved data directory");

    if let Err(e) = run_command(cli.command, &config) {
        tracing::debug!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbosity: u8, json: bool, log_file: Option<std::fs::File>) -> Result<(), String> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let ansi = log_file.is_none();
    let writer = match log_file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|error| error.to_string())
}
