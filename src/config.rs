//! Data-directory resolution.
//!
//! All state lives in one directory holding `tasks.json` and
//! `notifications.json`. The paths are resolved once at startup and handed
//! to the stores explicitly.

use std::path::{Path, PathBuf};

use crate::db::ensure_collection_file;
use crate::error::TaskResult;

pub const TASKS_FILE: &str = "tasks.json";
pub const NOTIFICATIONS_FILE: &str = "notifications.json";
pub const LOG_FILE: &str = "taskdash.log";
pub const DATA_DIR_ENV: &str = "TASKDASH_DIR";

/// Resolved locations of the persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub notifications_path: PathBuf,
}

impl Config {
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Config {
            tasks_path: data_dir.join(TASKS_FILE),
            notifications_path: data_dir.join(NOTIFICATIONS_FILE),
            data_dir,
        }
    }

    /// Resolve from the `--data-dir` flag, then `TASKDASH_DIR`, then `$HOME/.taskdash`.
    pub fn resolve(flag: Option<&Path>) -> Self {
        Self::resolve_with(
            flag,
            std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
    }

    fn resolve_with(flag: Option<&Path>, env_dir: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        let dir = flag
            .map(Path::to_path_buf)
            .or(env_dir.filter(|d| !d.as_os_str().is_empty()))
            .unwrap_or_else(|| home.unwrap_or_else(|| PathBuf::from(".")).join(".taskdash"));
        Self::in_dir(dir)
    }

    /// Create the directory and both files (as `[]`) if they are missing.
    pub fn ensure(&self) -> TaskResult<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        ensure_collection_file(&self.tasks_path)?;
        ensure_collection_file(&self.notifications_path)?;
        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flag_wins_over_env_and_home() {
        let cfg = Config::resolve_with(
            Some(Path::new("/tmp/flag")),
            Some(PathBuf::from("/tmp/env")),
            Some(PathBuf::from("/home/me")),
        );
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/flag"));
        assert_eq!(cfg.tasks_path, PathBuf::from("/tmp/flag/tasks.json"));
        assert_eq!(cfg.notifications_path, PathBuf::from("/tmp/flag/notifications.json"));
    }

    #[test]
    fn test_env_then_home_fallbacks() {
        let cfg = Config::resolve_with(None, Some(PathBuf::from("/tmp/env")), Some(PathBuf::from("/home/me")));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/env"));

        let cfg = Config::resolve_with(None, Some(PathBuf::new()), Some(PathBuf::from("/home/me")));
        assert_eq!(cfg.data_dir, PathBuf::from("/home/me/.taskdash"));

        let cfg = Config::resolve_with(None, None, None);
        assert_eq!(cfg.data_dir, PathBuf::from("./.taskdash"));
    }

    #[test]
    fn test_ensure_creates_empty_arrays() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::in_dir(dir.path().join("nested"));
        cfg.ensure().unwrap();
        assert_eq!(std::fs::read_to_string(&cfg.tasks_path).unwrap().trim(), "[]");
        assert_eq!(std::fs::read_to_string(&cfg.notifications_path).unwrap().trim(), "[]");

        // Existing contents are left alone.
        std::fs::write(&cfg.tasks_path, r#"[{"id":"a"}]"#).unwrap();
        cfg.ensure().unwrap();
        assert_eq!(std::fs::read_to_string(&cfg.tasks_path).unwrap(), r#"[{"id":"a"}]"#);
    }
}
