//! Access control evaluation.
//!
//! [`evaluate`] is a pure function of the task as currently stored. The
//! result must not be cached across requests: grants change between calls.

use serde::{Deserialize, Serialize};

use crate::share::Permission;
use crate::task::Task;
use crate::user::UserId;

/// A user's standing with respect to one task, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Owner,
    Editor,
    Viewer,
    NoAccess,
}

/// Task-level operations gated by [`AccessLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read the task.
    Read,
    /// Toggle completion or edit fields.
    Edit,
    /// Delete the task.
    Delete,
    /// Grant, modify or revoke sharing on behalf of others.
    ManageSharing,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ManageSharing => "manage sharing",
        })
    }
}

impl AccessLevel {
    /// Whether this level is sufficient for `action`.
    #[must_use]
    pub const fn allows(self, action: Action) -> bool {
        match action {
            Action::Read => !matches!(self, Self::NoAccess),
            Action::Edit => matches!(self, Self::Owner | Self::Editor),
            Action::Delete | Action::ManageSharing => matches!(self, Self::Owner),
        }
    }
}

/// Computes `user`'s access level on `task`.
#[must_use]
pub fn evaluate(task: &Task, user: &UserId) -> AccessLevel {
    if &task.owner == user {
        return AccessLevel::Owner;
    }
    match task.grant_for(user).map(|g| g.permission) {
        Some(Permission::Edit) => AccessLevel::Editor,
        Some(Permission::View) => AccessLevel::Viewer,
        None => AccessLevel::NoAccess,
    }
}
