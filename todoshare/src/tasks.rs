//! Task service: creation, reads and edits gated by access control.
//!
//! Every operation re-reads the task and re-evaluates the caller's access
//! level; nothing is cached between requests. Mutations hold the task's
//! lock from the access check until the store has applied the update, so a
//! concurrent revoke cannot slip between the two.

use std::sync::Arc;

use chrono::Utc;
use todoshare_model::{
    AccessLevel, Action, Category, Priority, Task, TaskDraft, TaskId, TaskPatch, TaskUpdate,
    UserId, evaluate,
};

use crate::directory::UserDirectory;
use crate::error::TaskError;
use crate::locks::TaskLocks;
use crate::store::{TaskQuery, TaskStore};

/// Checks that `user` may perform `action` on `task`.
///
/// # Errors
///
/// Returns [`TaskError::NotAuthorized`] if the user's level is too low.
pub fn authorize(task: &Task, user: &UserId, action: Action) -> Result<AccessLevel, TaskError> {
    let level = evaluate(task, user);
    if level.allows(action) {
        Ok(level)
    } else {
        tracing::debug!(task_id = %task.id, user = %user, ?level, %action, "access denied");
        Err(TaskError::NotAuthorized {
            user: user.clone(),
            action,
        })
    }
}

/// Optional filters for listing a user's own tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub tag: Option<String>,
}

impl TaskFilter {
    /// Whether `task` passes every set filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.category.is_none_or(|c| task.category == c)
            && self.priority.is_none_or(|p| task.priority == p)
            && self.completed.is_none_or(|c| task.completed == c)
            && self
                .tag
                .as_deref()
                .is_none_or(|tag| task.tags.iter().any(|t| t == tag))
    }
}

/// Access-controlled task operations.
pub struct TaskService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    rearm_on_reschedule: bool,
    locks: Arc<TaskLocks>,
}

impl<S: TaskStore, D: UserDirectory> TaskService<S, D> {
    /// Creates a service. `rearm_on_reschedule` decides whether editing a
    /// due or reminder time clears that kind from the fired ledger.
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>, rearm_on_reschedule: bool) -> Self {
        Self::with_locks(store, directory, rearm_on_reschedule, Arc::default())
    }

    pub(crate) const fn with_locks(
        store: Arc<S>,
        directory: Arc<D>,
        rearm_on_reschedule: bool,
        locks: Arc<TaskLocks>,
    ) -> Self {
        Self {
            store,
            directory,
            rearm_on_reschedule,
            locks,
        }
    }

    /// Creates a task owned and created by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] for an invalid draft.
    pub async fn create(&self, caller: &UserId, draft: TaskDraft) -> Result<Task, TaskError> {
        let task = Task::new(caller.clone(), caller.clone(), draft, Utc::now())?;
        let task = self.store.insert(task).await?;
        tracing::info!(task_id = %task.id, owner = %task.owner, "task created");
        Ok(task)
    }

    /// Creates a task on behalf of `owner`; `creator` is recorded only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UserNotFound`] if `owner` is not in the
    /// directory, or [`TaskError::Validation`] for an invalid draft.
    pub async fn create_for(
        &self,
        creator: &UserId,
        owner: &UserId,
        draft: TaskDraft,
    ) -> Result<Task, TaskError> {
        if self.directory.find_by_id(owner).await?.is_none() {
            return Err(TaskError::UserNotFound(owner.clone()));
        }
        let task = Task::new(owner.clone(), creator.clone(), draft, Utc::now())?;
        let task = self.store.insert(task).await?;
        tracing::info!(
            task_id = %task.id,
            owner = %task.owner,
            creator = %task.creator,
            "task created on behalf of owner"
        );
        Ok(task)
    }

    /// Reads a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] or [`TaskError::NotAuthorized`].
    pub async fn get(&self, id: &TaskId, caller: &UserId) -> Result<Task, TaskError> {
        let task = self.store.find_by_id(id).await?;
        authorize(&task, caller, Action::Read)?;
        Ok(task)
    }

    /// The caller's current access level on a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if the task does not exist.
    pub async fn access_level(&self, id: &TaskId, caller: &UserId) -> Result<AccessLevel, TaskError> {
        let task = self.store.find_by_id(id).await?;
        Ok(evaluate(&task, caller))
    }

    /// Sets the completion flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] or [`TaskError::NotAuthorized`]
    /// unless the caller is the owner or an editor.
    pub async fn set_completed(
        &self,
        id: &TaskId,
        caller: &UserId,
        completed: bool,
    ) -> Result<Task, TaskError> {
        let _lock = self.locks.acquire(id).await;
        let task = self.store.find_by_id(id).await?;
        authorize(&task, caller, Action::Edit)?;
        let outcome = self
            .store
            .update(id, TaskUpdate::SetCompleted(completed))
            .await?;
        tracing::debug!(task_id = %id, by = %caller, completed, "completion set");
        Ok(outcome.task)
    }

    /// Flips the completion flag.
    ///
    /// # Errors
    ///
    /// Same as [`set_completed`](Self::set_completed).
    pub async fn toggle_completion(&self, id: &TaskId, caller: &UserId) -> Result<Task, TaskError> {
        let _lock = self.locks.acquire(id).await;
        let task = self.store.find_by_id(id).await?;
        authorize(&task, caller, Action::Edit)?;
        let outcome = self.store.update(id, TaskUpdate::ToggleCompleted).await?;
        tracing::debug!(
            task_id = %id,
            by = %caller,
            completed = outcome.task.completed,
            "completion toggled"
        );
        Ok(outcome.task)
    }

    /// Applies a field patch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] for an invalid patch, otherwise
    /// the same errors as [`set_completed`](Self::set_completed).
    pub async fn edit(&self, id: &TaskId, caller: &UserId, patch: TaskPatch) -> Result<Task, TaskError> {
        let patch = patch.validate()?;
        let _lock = self.locks.acquire(id).await;
        let task = self.store.find_by_id(id).await?;
        authorize(&task, caller, Action::Edit)?;
        let outcome = self
            .store
            .update(
                id,
                TaskUpdate::Edit {
                    patch,
                    rearm_reminders: self.rearm_on_reschedule,
                },
            )
            .await?;
        tracing::debug!(task_id = %id, by = %caller, changed = outcome.changed, "task edited");
        Ok(outcome.task)
    }

    /// Deletes a task. Only the owner may delete, whatever grants exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] or [`TaskError::NotAuthorized`].
    pub async fn delete(&self, id: &TaskId, caller: &UserId) -> Result<(), TaskError> {
        let _lock = self.locks.acquire(id).await;
        let task = self.store.find_by_id(id).await?;
        authorize(&task, caller, Action::Delete)?;
        self.store.delete(id).await?;
        tracing::info!(task_id = %id, owner = %caller, "task deleted");
        Ok(())
    }

    /// Lists the caller's own tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails.
    pub async fn list(&self, caller: &UserId, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
        let mut tasks = self.store.find(&TaskQuery::OwnedBy(caller.clone())).await?;
        tasks.retain(|t| filter.matches(t));
        Ok(tasks)
    }
}
