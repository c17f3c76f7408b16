//! Notification dedup ledger.
//!
//! The ledger is the `reminders_fired` set stored on each task. It only
//! grows through [`DedupLedger::record`]; there is no clearing API.

use std::collections::BTreeSet;
use std::sync::Arc;

use todoshare_model::{ReminderKind, TaskId, TaskUpdate};

use crate::store::{StoreError, TaskStore};

/// Read and record access to the per-task fired-reminder set.
pub struct DedupLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for DedupLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskStore> DedupLedger<S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Kinds already notified for a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the task cannot be read.
    pub async fn fired(&self, task: &TaskId) -> Result<BTreeSet<ReminderKind>, StoreError> {
        Ok(self.store.find_by_id(task).await?.reminders_fired().clone())
    }

    /// Whether `kind` has already been notified for a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the task cannot be read.
    pub async fn has_fired(&self, task: &TaskId, kind: ReminderKind) -> Result<bool, StoreError> {
        Ok(self.store.find_by_id(task).await?.has_fired(kind))
    }

    /// Adds `kind` to the task's set in one atomic store update.
    ///
    /// Returns `true` only for the caller that actually inserted it; a
    /// concurrent or repeated record of the same kind returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    pub async fn record(&self, task: &TaskId, kind: ReminderKind) -> Result<bool, StoreError> {
        let outcome = self
            .store
            .update(task, TaskUpdate::MarkReminderFired(kind))
            .await?;
        Ok(outcome.changed)
    }
}
