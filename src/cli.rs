use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// File-backed personal task dashboard.
/// State lives in ~/.taskdash unless --data-dir or TASKDASH_DIR says otherwise.
#[derive(Parser)]
#[command(name = "taskdash", version, about = "Personal task dashboard")]
pub struct Cli {
    /// Directory holding tasks.json and notifications.json.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}
