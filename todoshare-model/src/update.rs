//! Atomic single-document updates.
//!
//! A task store applies one [`TaskUpdate`] to one task as an indivisible
//! step. Each variant touches only the fields it names, so concurrent
//! updates to unrelated fields of the same task never overwrite each
//! other. Grant variants re-check their own precondition at apply time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reminder::ReminderKind;
use crate::share::{Permission, ShareGrant};
use crate::task::{Task, TaskPatch};
use crate::user::UserId;

/// One atomic field-level operation on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskUpdate {
    /// Append a grant. Fails if the grantee already holds one.
    AddGrant(ShareGrant),
    /// Replace the permission of an existing grant in place.
    SetGrantPermission {
        grantee: UserId,
        permission: Permission,
    },
    /// Remove the grant held by `grantee`.
    RemoveGrant { grantee: UserId },
    /// Set the completion flag.
    SetCompleted(bool),
    /// Flip the completion flag against the stored value.
    ToggleCompleted,
    /// Apply a validated field patch.
    ///
    /// With `rearm_reminders`, a reminder kind whose timestamp actually
    /// changes is dropped from the fired ledger in the same step.
    Edit {
        patch: TaskPatch,
        rearm_reminders: bool,
    },
    /// Add a kind to the fired ledger (set union).
    MarkReminderFired(ReminderKind),
}

/// A grant update whose precondition no longer holds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpdateConflict {
    /// The grantee already has a grant on this task.
    #[error("task already shared with {0}")]
    GrantExists(UserId),
    /// The grantee has no grant on this task.
    #[error("no grant for {0}")]
    GrantMissing(UserId),
}

impl TaskUpdate {
    /// Applies the update to `task`, returning whether anything changed.
    ///
    /// `now` stamps `updated_at` when a user-visible field changes; ledger
    /// bookkeeping does not touch it.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateConflict`] if a grant precondition fails. The task
    /// is left untouched in that case.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) -> Result<bool, UpdateConflict> {
        let changed = match self {
            Self::AddGrant(grant) => {
                if task.grant_for(&grant.grantee).is_some() {
                    return Err(UpdateConflict::GrantExists(grant.grantee));
                }
                task.shares_mut().push(grant);
                true
            }
            Self::SetGrantPermission {
                grantee,
                permission,
            } => {
                let Some(grant) = task.shares_mut().iter_mut().find(|g| g.grantee == grantee)
                else {
                    return Err(UpdateConflict::GrantMissing(grantee));
                };
                let changed = grant.permission != permission;
                grant.permission = permission;
                changed
            }
            Self::RemoveGrant { grantee } => {
                let shares = task.shares_mut();
                let before = shares.len();
                shares.retain(|g| g.grantee != grantee);
                if shares.len() == before {
                    return Err(UpdateConflict::GrantMissing(grantee));
                }
                true
            }
            Self::SetCompleted(completed) => {
                let changed = task.completed != completed;
                task.completed = completed;
                changed
            }
            Self::ToggleCompleted => {
                task.completed = !task.completed;
                true
            }
            Self::Edit {
                patch,
                rearm_reminders,
            } => apply_patch(task, patch, rearm_reminders),
            Self::MarkReminderFired(kind) => return Ok(task.reminders_fired_mut().insert(kind)),
        };
        if changed {
            task.updated_at = now;
        }
        Ok(changed)
    }
}

fn apply_patch(task: &mut Task, patch: TaskPatch, rearm_reminders: bool) -> bool {
    let before = task.clone();

    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(category) = patch.category {
        task.category = category;
    }
    if let Some(tags) = patch.tags {
        task.tags = tags;
    }
    if let Some(due_at) = patch.due_at {
        task.due_at = due_at;
    }
    if let Some(remind_at) = patch.remind_at {
        task.remind_at = remind_at;
    }

    if rearm_reminders {
        for kind in ReminderKind::ALL {
            if before.reminder_time(kind) != task.reminder_time(kind) {
                task.reminders_fired_mut().remove(&kind);
            }
        }
    }

    &before != task
}
