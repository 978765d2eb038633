//! Error types for the worker pool and the geo cache.

use thiserror::Error;

/// Boxed error returned by task execution functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, GeopoolError>;

/// Errors surfaced by constructors, configuration loading and snapshot decoding.
#[derive(Debug, Error)]
pub enum GeopoolError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid snapshot format")]
    InvalidFormat,

    #[cfg(feature = "snapshot")]
    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error carried inside a [`TaskResult`](crate::pool::TaskResult).
///
/// These never abort the pool; they travel down the output channel in place of a value.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task had no argument or no execution function.
    #[error("fake task")]
    FakeTask,

    /// The execution function returned an error.
    #[error("{0}")]
    Execution(BoxError),
}

impl TaskError {
    pub fn is_fake(&self) -> bool {
        matches!(self, TaskError::FakeTask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_task_message() {
        assert_eq!(TaskError::FakeTask.to_string(), "fake task");
        assert!(TaskError::FakeTask.is_fake());
    }

    #[test]
    fn test_execution_error_keeps_message() {
        let err = TaskError::Execution("upstream refused".into());
        assert_eq!(err.to_string(), "upstream refused");
        assert!(!err.is_fake());
    }
}
