//! In-memory task store.
//!
//! The [`InMemoryTaskStore`] keeps every task in one map behind a
//! [`RwLock`]. Updates take the write lock for the duration of a single
//! [`TaskUpdate::apply`], which is what makes each update atomic. Nothing
//! is persisted; all data is lost when the process exits.

use std::collections::HashMap;

use chrono::Utc;
use todoshare_model::{Task, TaskId, TaskUpdate};
use tokio::sync::RwLock;

use super::{StoreError, TaskQuery, TaskStore, UpdateOutcome};

/// In-memory [`TaskStore`] keyed by [`TaskId`].
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no tasks are stored.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::Duplicate(task.id));
        }
        tasks.insert(task.id.clone(), task.clone());
        drop(tasks);
        Ok(task)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn find(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<Task> = tasks.values().filter(|t| query.matches(t)).cloned().collect();
        drop(tasks);
        found.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(found)
    }

    async fn update(&self, id: &TaskId, update: TaskUpdate) -> Result<UpdateOutcome, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        // Apply to a copy so a failed precondition leaves the stored task untouched.
        let mut next = task.clone();
        let changed = update.apply(&mut next, Utc::now())?;
        *task = next.clone();
        drop(tasks);
        Ok(UpdateOutcome {
            task: next,
            changed,
        })
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.tasks
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
