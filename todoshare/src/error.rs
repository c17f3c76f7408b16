//! Errors surfaced to callers of the engine.
//!
//! The variants keep "you lack permission", "target does not exist" and
//! "already in that state" apart: several of them are expected,
//! recoverable client conditions rather than failures.

use thiserror::Error;
use todoshare_model::{Action, TaskId, UpdateConflict, UserId, ValidationError};

use crate::directory::DirectoryError;
use crate::store::StoreError;

/// Errors that can occur during task, sharing and reminder operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The caller's access level does not permit the action.
    #[error("{user} is not authorized to {action} this task")]
    NotAuthorized {
        /// Caller that was refused.
        user: UserId,
        /// What they attempted.
        action: Action,
    },
    /// Task with the given id was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// User with the given id was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The grantee e-mail or id does not resolve to a user.
    #[error("no user matches {0}")]
    UnknownGrantee(String),
    /// The grantee already holds a grant; use a permission update instead.
    #[error("task already shared with {0}")]
    AlreadyShared(UserId),
    /// The grantee holds no grant on the task.
    #[error("task is not shared with {0}")]
    GrantNotFound(UserId),
    /// The owner tried to share a task with themselves.
    #[error("cannot share a task with its owner")]
    SelfShareRejected,
    /// Input was rejected at the boundary.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Transient infrastructure failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict(UpdateConflict::GrantExists(user)) => Self::AlreadyShared(user),
            StoreError::Conflict(UpdateConflict::GrantMissing(user)) => Self::GrantNotFound(user),
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            StoreError::Duplicate(id) => Self::StoreUnavailable(format!("duplicate task id {id}")),
        }
    }
}

impl From<DirectoryError> for TaskError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unavailable(reason) => Self::StoreUnavailable(reason),
        }
    }
}
