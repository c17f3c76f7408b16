//! Engine wiring: one store and one directory shared by every component.

use std::sync::Arc;

use todoshare_model::UserId;

use crate::config::ReminderSettings;
use crate::directory::UserDirectory;
use crate::error::TaskError;
use crate::locks::TaskLocks;
use crate::reminders::{DedupLedger, Notifier, ReminderQueries, ReminderScanner, ScannerHandle};
use crate::sharing::SharingManager;
use crate::store::{TaskQuery, TaskStore};
use crate::tasks::TaskService;

/// What [`Engine::remove_account`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountRemoval {
    /// Tasks owned by the user that were deleted.
    pub deleted: usize,
    /// Grants the user held on other owners' tasks that were removed.
    pub revoked: usize,
}

/// Task service, sharing manager and reminder components over one store.
pub struct Engine<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    settings: ReminderSettings,
    tasks: TaskService<S, D>,
    sharing: SharingManager<S, D>,
    reminders: ReminderQueries<S>,
    ledger: DedupLedger<S>,
}

impl<S: TaskStore, D: UserDirectory> Engine<S, D> {
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>, settings: ReminderSettings) -> Self {
        // Task edits and sharing changes serialize on the same per-task locks.
        let locks = Arc::new(TaskLocks::default());
        Self {
            tasks: TaskService::with_locks(
                Arc::clone(&store),
                Arc::clone(&directory),
                settings.rearm_on_reschedule,
                Arc::clone(&locks),
            ),
            sharing: SharingManager::with_locks(Arc::clone(&store), Arc::clone(&directory), locks),
            reminders: ReminderQueries::new(Arc::clone(&store), settings.horizon),
            ledger: DedupLedger::new(Arc::clone(&store)),
            store,
            directory,
            settings,
        }
    }

    pub const fn tasks(&self) -> &TaskService<S, D> {
        &self.tasks
    }

    pub const fn sharing(&self) -> &SharingManager<S, D> {
        &self.sharing
    }

    pub const fn reminders(&self) -> &ReminderQueries<S> {
        &self.reminders
    }

    pub const fn ledger(&self) -> &DedupLedger<S> {
        &self.ledger
    }

    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub const fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub const fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    /// Builds a scanner over this engine's store with the configured window.
    pub fn scanner<N: Notifier>(&self, notifier: N) -> ReminderScanner<S, N> {
        ReminderScanner::new(Arc::clone(&self.store), notifier, self.settings.window)
    }

    /// Builds a scanner and spawns it at the configured interval.
    #[must_use]
    pub fn start_scanner<N>(&self, notifier: N) -> ScannerHandle
    where
        S: 'static,
        N: Notifier + 'static,
    {
        self.scanner(notifier).spawn(self.settings.scan_interval)
    }

    /// Removes every trace of `user` from the task data.
    ///
    /// Tasks the user owns are deleted, which drops their grants with
    /// them. Grants the user holds on other owners' tasks are revoked.
    /// Removing the account from the directory is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails. Tasks
    /// that disappear concurrently are skipped.
    pub async fn remove_account(&self, user: &UserId) -> Result<AccountRemoval, TaskError> {
        let mut removal = AccountRemoval::default();

        for task in self.store.find(&TaskQuery::OwnedBy(user.clone())).await? {
            match self.tasks.delete(&task.id, user).await {
                Ok(()) => removal.deleted += 1,
                Err(TaskError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        for task in self.store.find(&TaskQuery::SharedWith(user.clone())).await? {
            match self.sharing.revoke(&task.id, user, user).await {
                Ok(_) => removal.revoked += 1,
                Err(TaskError::NotFound(_) | TaskError::GrantNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            user = %user,
            deleted = removal.deleted,
            revoked = removal.revoked,
            "account removed from task data"
        );
        Ok(removal)
    }
}
