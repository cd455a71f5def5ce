//! Error types for the scheduling and reward engine.

use chrono::NaiveDate;

/// A task submission that was rejected before anything was written.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("task must belong to a group")]
    MissingGroup,

    #[error("custom tasks need positive reward points and minutes")]
    NonPositiveCustomReward,

    #[error("due date {due} is before today ({today})")]
    DueDateInPast { due: NaiveDate, today: NaiveDate },

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),

    #[error("invalid date '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),
}

/// Failure reported by a storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task {0} not found")]
    TaskNotFound(u64),

    /// The store refused or failed a write for a reason of its own.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid task: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("task {0} is completed and can only be toggled or deleted")]
    CompletedTaskImmutable(u64),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
