//! Per-task async locks shared by every component that mutates a task.
//!
//! A read-check-write sequence (fetch the task, evaluate access, send one
//! update) holds the task's lock throughout, so a revoke can never land
//! between another caller's access check and its write.

use std::collections::HashMap;
use std::sync::Arc;

use todoshare_model::TaskId;
use tokio::sync::OwnedMutexGuard;

/// Async locks keyed by task, dropped from the map once nobody holds them.
#[derive(Default)]
pub(crate) struct TaskLocks {
    locks: parking_lot::Mutex<HashMap<TaskId, Arc<tokio::sync::Mutex<()>>>>,
}

/// Holds one task's lock; prunes the map entry on drop when uncontended.
pub(crate) struct TaskLockGuard {
    locks: Arc<TaskLocks>,
    id: TaskId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TaskLocks {
    pub(crate) async fn acquire(self: &Arc<Self>, id: &TaskId) -> TaskLockGuard {
        let lock = Arc::clone(self.locks.lock().entry(id.clone()).or_default());
        let guard = lock.lock_owned().await;
        TaskLockGuard {
            locks: Arc::clone(self),
            id: id.clone(),
            guard: Some(guard),
        }
    }

    /// Number of tasks with a live lock entry.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for TaskLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.locks.lock();
        if let Some(lock) = locks.get(&self.id)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(&self.id);
        }
    }
}
