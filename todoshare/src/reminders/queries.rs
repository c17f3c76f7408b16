//! Per-user reminder views: what is coming up and what is overdue.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use todoshare_model::{ReminderKind, Task, TaskId, UserId};

use crate::error::TaskError;
use crate::store::{TaskQuery, TaskStore};

/// Default look-ahead for [`ReminderQueries::upcoming`].
pub const DEFAULT_HORIZON_HOURS: i64 = 24;

/// A reminder the user will receive within the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingReminder {
    pub task_id: TaskId,
    pub title: String,
    pub kind: ReminderKind,
    pub fires_at: DateTime<Utc>,
    /// Whether the scanner has already sent this one.
    pub notified: bool,
}

pub struct ReminderQueries<S> {
    store: Arc<S>,
    horizon: Duration,
}

impl<S: TaskStore> ReminderQueries<S> {
    #[must_use]
    pub const fn new(store: Arc<S>, horizon: Duration) -> Self {
        Self { store, horizon }
    }

    /// Reminders for incomplete tasks the user can read whose due or
    /// reminder time lies in `[now, now + horizon]`, soonest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails.
    pub async fn upcoming(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<UpcomingReminder>, TaskError> {
        let end = now
            .checked_add_signed(self.horizon)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let tasks = self.store.find(&TaskQuery::VisibleTo(user.clone())).await?;
        let mut upcoming: Vec<UpcomingReminder> = tasks
            .iter()
            .filter(|task| !task.completed)
            .flat_map(|task| {
                ReminderKind::ALL.into_iter().filter_map(move |kind| {
                    let at = task.reminder_time(kind)?;
                    (now <= at && at <= end).then(|| UpcomingReminder {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                        kind,
                        fires_at: at,
                        notified: task.has_fired(kind),
                    })
                })
            })
            .collect();
        upcoming.sort_by(|a, b| a.fires_at.cmp(&b.fires_at).then(a.kind.cmp(&b.kind)));
        Ok(upcoming)
    }

    /// Incomplete tasks owned by the user whose due date has passed,
    /// earliest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::StoreUnavailable`] if the store fails.
    pub async fn overdue(&self, user: &UserId, now: DateTime<Utc>) -> Result<Vec<Task>, TaskError> {
        let mut tasks = self.store.find(&TaskQuery::OwnedBy(user.clone())).await?;
        tasks.retain(|t| !t.completed && t.due_at.is_some_and(|due| due < now));
        tasks.sort_by_key(|t| t.due_at);
        Ok(tasks)
    }
}
