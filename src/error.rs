//! Error types shared by the stores, the mutation service and the command layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// The request was rejected before anything was written.
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not move {path} into place: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    /// Process exit code for the CLI boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskError::Validation(_) => 2,
            TaskError::NotFound(_) => 3,
            _ => 1,
        }
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
