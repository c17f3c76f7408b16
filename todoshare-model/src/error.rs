//! Validation failures raised at the model boundary.

use thiserror::Error;

use crate::task::MAX_TASK_TITLE_LENGTH;

/// A value was rejected before it could reach a task record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title is empty after trimming.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds [`MAX_TASK_TITLE_LENGTH`] characters.
    #[error("task title too long (max {MAX_TASK_TITLE_LENGTH} characters)")]
    TitleTooLong,
    /// A permission string other than `view` or `edit`.
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    /// A priority string outside the closed set.
    #[error("unknown priority: {0}")]
    UnknownPriority(String),
    /// A category string outside the closed set.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// A reminder kind string other than `due_date` or `custom_reminder`.
    #[error("unknown reminder kind: {0}")]
    UnknownReminderKind(String),
    /// A tag that is empty after trimming.
    #[error("tags cannot be empty")]
    TagEmpty,
    /// A user identifier that is empty after trimming.
    #[error("user id cannot be empty")]
    UserIdEmpty,
}
