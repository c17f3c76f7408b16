//! User directory contract and an in-memory implementation.
//!
//! The engine only needs to resolve a grantee given as an e-mail address
//! or a user id. Account management itself lives elsewhere.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;
use todoshare_model::{UserId, UserRef};

/// Errors that can occur during directory lookups.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory backend is unreachable.
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Trait for resolving users by e-mail or id.
pub trait UserDirectory: Send + Sync {
    /// Look up a user by e-mail address (case-insensitive).
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRef>, DirectoryError>> + Send;

    /// Look up a user by id.
    fn find_by_id(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Result<Option<UserRef>, DirectoryError>> + Send;
}

/// Canonical form used for e-mail comparisons.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// In-memory [`UserDirectory`].
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, UserRef>>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a directory holding `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserRef>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.add(user);
        }
        directory
    }

    /// Adds or replaces a user, returning the previous entry.
    pub fn add(&self, user: UserRef) -> Option<UserRef> {
        self.users.write().insert(user.id.clone(), user)
    }

    /// Removes a user, returning the entry if it existed.
    pub fn remove(&self, id: &UserId) -> Option<UserRef> {
        self.users.write().remove(id)
    }

    /// Number of registered users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl UserDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRef>, DirectoryError> {
        let wanted = normalize_email(email);
        Ok(self
            .users
            .read()
            .values()
            .find(|u| normalize_email(&u.email) == wanted)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRef>, DirectoryError> {
        Ok(self.users.read().get(id).cloned())
    }
}
