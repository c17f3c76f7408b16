//! Share grants: who else may see or edit a task.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::user::UserId;

/// Permission carried by a share grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read-only access.
    #[default]
    View,
    /// Read access plus completion toggling and field edits.
    Edit,
}

impl Permission {
    /// Wire name of the permission.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            other => Err(ValidationError::UnknownPermission(other.to_string())),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(grantee, permission)` entry on a task.
///
/// `granted_at` is fixed when the grant is created; permission changes
/// replace `permission` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    /// User the task is shared with.
    pub grantee: UserId,
    /// What the grantee may do.
    pub permission: Permission,
    /// When the grant was created.
    pub granted_at: DateTime<Utc>,
}

impl ShareGrant {
    /// Creates a grant stamped with `granted_at`.
    #[must_use]
    pub const fn new(grantee: UserId, permission: Permission, granted_at: DateTime<Utc>) -> Self {
        Self {
            grantee,
            permission,
            granted_at,
        }
    }
}
