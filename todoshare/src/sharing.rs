//! Sharing manager: grants, permission changes and revocation.
//!
//! All three mutations on a task are serialized through a per-task async
//! mutex, and each one reaches the store as a single atomic grant update
//! that re-checks its own precondition. Mutations on different tasks do
//! not contend.

use std::sync::Arc;

use chrono::Utc;
use todoshare_model::{
    Action, Permission, ShareGrant, Task, TaskId, TaskUpdate, UserId, UserRef, ValidationError,
};

use crate::directory::UserDirectory;
use crate::error::TaskError;
use crate::locks::TaskLocks;
use crate::store::{TaskQuery, TaskStore};
use crate::tasks::authorize;

/// Who a task is being shared with, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    /// Resolve through the directory by account id.
    Id(UserId),
    /// Resolve through the directory by e-mail address.
    Email(String),
}

impl Grantee {
    /// Interprets free-form input: anything containing `@` is an e-mail.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UserIdEmpty`] for blank input.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::UserIdEmpty);
        }
        if input.contains('@') {
            Ok(Self::Email(input.to_string()))
        } else {
            Ok(Self::Id(UserId::from(input)))
        }
    }
}

impl From<UserId> for Grantee {
    fn from(id: UserId) -> Self {
        Self::Id(id)
    }
}

impl From<&UserId> for Grantee {
    fn from(id: &UserId) -> Self {
        Self::Id(id.clone())
    }
}

impl std::fmt::Display for Grantee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Email(email) => f.write_str(email),
        }
    }
}

/// Grants, updates and revokes task sharing under ownership rules.
pub struct SharingManager<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    locks: Arc<TaskLocks>,
}

impl<S: TaskStore, D: UserDirectory> SharingManager<S, D> {
    /// Creates a manager over the given store and directory.
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self::with_locks(store, directory, Arc::default())
    }

    /// Creates a manager that serializes on locks shared with other
    /// task mutators.
    pub(crate) const fn with_locks(store: Arc<S>, directory: Arc<D>, locks: Arc<TaskLocks>) -> Self {
        Self {
            store,
            directory,
            locks,
        }
    }

    /// Shares a task with another user.
    ///
    /// # Errors
    ///
    /// Checked in order: [`TaskError::NotFound`], [`TaskError::NotAuthorized`]
    /// unless `caller` owns the task, [`TaskError::UnknownGrantee`],
    /// [`TaskError::SelfShareRejected`], [`TaskError::AlreadyShared`]. An
    /// existing grant is never silently upgraded.
    pub async fn share(
        &self,
        task_id: &TaskId,
        caller: &UserId,
        grantee: &Grantee,
        permission: Permission,
    ) -> Result<Task, TaskError> {
        let _lock = self.locks.acquire(task_id).await;
        let task = self.store.find_by_id(task_id).await?;
        authorize(&task, caller, Action::ManageSharing)?;

        let user = self.resolve(grantee).await?;
        if user.id == task.owner {
            return Err(TaskError::SelfShareRejected);
        }
        if task.grant_for(&user.id).is_some() {
            return Err(TaskError::AlreadyShared(user.id));
        }

        let grant = ShareGrant::new(user.id.clone(), permission, Utc::now());
        let outcome = self
            .store
            .update(task_id, TaskUpdate::AddGrant(grant))
            .await?;
        tracing::info!(
            task_id = %task_id,
            grantee = %user.id,
            permission = %permission,
            "task shared"
        );
        Ok(outcome.task)
    }

    /// Changes the permission of an existing grant in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`], [`TaskError::NotAuthorized`] unless
    /// `caller` owns the task, or [`TaskError::GrantNotFound`].
    pub async fn update_permission(
        &self,
        task_id: &TaskId,
        caller: &UserId,
        grantee: &UserId,
        permission: Permission,
    ) -> Result<Task, TaskError> {
        let _lock = self.locks.acquire(task_id).await;
        let task = self.store.find_by_id(task_id).await?;
        authorize(&task, caller, Action::ManageSharing)?;
        if task.grant_for(grantee).is_none() {
            return Err(TaskError::GrantNotFound(grantee.clone()));
        }

        let outcome = self
            .store
            .update(
                task_id,
                TaskUpdate::SetGrantPermission {
                    grantee: grantee.clone(),
                    permission,
                },
            )
            .await?;
        tracing::info!(
            task_id = %task_id,
            grantee = %grantee,
            permission = %permission,
            changed = outcome.changed,
            "share permission updated"
        );
        Ok(outcome.task)
    }

    /// Removes a grant. The owner may revoke anyone; a grantee may remove
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`], [`TaskError::NotAuthorized`] if the
    /// caller is neither the owner nor the grantee, or
    /// [`TaskError::GrantNotFound`].
    pub async fn revoke(
        &self,
        task_id: &TaskId,
        caller: &UserId,
        grantee: &UserId,
    ) -> Result<Task, TaskError> {
        let _lock = self.locks.acquire(task_id).await;
        let task = self.store.find_by_id(task_id).await?;
        if caller != grantee {
            authorize(&task, caller, Action::ManageSharing)?;
        }
        if task.grant_for(grantee).is_none() {
            return Err(TaskError::GrantNotFound(grantee.clone()));
        }

        let outcome = self
            .store
            .update(
                task_id,
                TaskUpdate::RemoveGrant {
                    grantee: grantee.clone(),
                },
            )
            .await?;
        tracing::info!(
            task_id = %task_id,
            grantee = %grantee,
            by = %caller,
            still_shared = outcome.task.is_shared(),
            "share revoked"
        );
        Ok(outcome.task)
    }

    /// Tasks owned by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails.
    pub async fn tasks_owned_by(&self, user: &UserId) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.find(&TaskQuery::OwnedBy(user.clone())).await?)
    }

    /// Tasks other users have shared with `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails.
    pub async fn tasks_shared_with(&self, user: &UserId) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.find(&TaskQuery::SharedWith(user.clone())).await?)
    }

    /// Tasks owned by `user` that are shared with at least one other user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails.
    pub async fn tasks_shared_by_owner(&self, user: &UserId) -> Result<Vec<Task>, TaskError> {
        Ok(self
            .store
            .find(&TaskQuery::SharedByOwner(user.clone()))
            .await?)
    }

    async fn resolve(&self, grantee: &Grantee) -> Result<UserRef, TaskError> {
        let found = match grantee {
            Grantee::Id(id) => self.directory.find_by_id(id).await?,
            Grantee::Email(email) => self.directory.find_by_email(email).await?,
        };
        found.ok_or_else(|| TaskError::UnknownGrantee(grantee.to_string()))
    }

    /// Number of tasks with an in-flight sharing operation.
    #[cfg(test)]
    fn locked_tasks(&self) -> usize {
        self.locks.len()
    }
}
