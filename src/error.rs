//! Error types for the task tracker.

/// Top-level error type for store, API, and dispatcher operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Rejected input (missing or empty title).
    #[error("validation error: {0}")]
    Validation(String),

    /// No task with this id for the requesting owner.
    #[error("task not found: {0}")]
    NotFound(String),

    /// SQLite query or connectivity failure.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Store mutex poisoned.
    #[error("lock poisoned: {0}")]
    Lock(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TaskError>;
