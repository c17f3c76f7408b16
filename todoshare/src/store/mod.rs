//! Task store contract.
//!
//! The store is the only owner of task records. Callers never write a
//! whole document back; every mutation is one [`TaskUpdate`] applied
//! atomically to one task, so concurrent changes to unrelated fields of
//! the same task cannot be lost.
//!
//! Implementations include:
//! - [`InMemoryTaskStore`]: in-memory store for embedding and tests

pub mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use todoshare_model::{Task, TaskId, TaskUpdate, UpdateConflict, UserId};

pub use memory::InMemoryTaskStore;

/// Errors that can occur during task store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage is unreachable or failing.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// No task with this id exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A task with this id already exists.
    #[error("task already exists: {0}")]
    Duplicate(TaskId),

    /// An update's precondition failed at apply time.
    #[error(transparent)]
    Conflict(#[from] UpdateConflict),
}

/// Closed set of predicates a store can be queried with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskQuery {
    /// Tasks owned by the user.
    OwnedBy(UserId),
    /// Tasks on which the user holds a grant.
    SharedWith(UserId),
    /// Tasks owned by the user that have at least one grant.
    SharedByOwner(UserId),
    /// Tasks the user owns or holds a grant on.
    VisibleTo(UserId),
    /// Incomplete tasks whose due or reminder time lies in `[from, to]`.
    ReminderCandidates {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl TaskQuery {
    /// Evaluates the predicate against a task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::OwnedBy(user) => &task.owner == user,
            Self::SharedWith(user) => task.grant_for(user).is_some(),
            Self::SharedByOwner(user) => &task.owner == user && task.is_shared(),
            Self::VisibleTo(user) => &task.owner == user || task.grant_for(user).is_some(),
            Self::ReminderCandidates { from, to } => {
                let in_range = |at: Option<DateTime<Utc>>| at.is_some_and(|t| *from <= t && t <= *to);
                !task.completed && (in_range(task.due_at) || in_range(task.remind_at))
            }
        }
    }
}

/// Result of a successful [`TaskStore::update`].
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The task as stored after the update.
    pub task: Task,
    /// Whether the update changed anything.
    pub changed: bool,
}

/// Trait for key-addressed task persistence with atomic per-task updates.
pub trait TaskStore: Send + Sync {
    /// Store a new task.
    fn insert(&self, task: Task) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Fetch one task by id.
    fn find_by_id(&self, id: &TaskId) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Fetch every task matching `query`, newest first.
    fn find(&self, query: &TaskQuery) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Apply one atomic update to one task.
    fn update(
        &self,
        id: &TaskId,
        update: TaskUpdate,
    ) -> impl Future<Output = Result<UpdateOutcome, StoreError>> + Send;

    /// Remove a task.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), StoreError>> + Send;
}
