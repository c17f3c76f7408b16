//! Delivery of fired reminders.
//!
//! The scanner hands every newly fired reminder to a [`Notifier`]. Delivery
//! is best effort: the ledger entry is written before the notifier runs,
//! so a lost delivery is never retried.

use std::future::Future;

use chrono::{DateTime, Utc};
use todoshare_model::{ReminderKind, Task, TaskId, UserId};
use tokio::sync::mpsc;

/// One reminder that fired during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub task_id: TaskId,
    pub title: String,
    pub kind: ReminderKind,
    /// The due or reminder time the notice refers to.
    pub fires_at: DateTime<Utc>,
    /// Whole minutes from the scan instant to `fires_at`, rounded.
    pub minutes_until: i64,
    /// Owner followed by every grantee.
    pub recipients: Vec<UserId>,
}

impl FiredReminder {
    /// Builds the reminder for `kind` of `task` as seen at `now`.
    #[must_use]
    pub fn new(task: &Task, kind: ReminderKind, fires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            kind,
            fires_at,
            minutes_until: minutes_between(now, fires_at),
            recipients: task.participants(),
        }
    }

    /// Text shown to recipients.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.message(self.minutes_until)
    }
}

/// Whole minutes from `from` to `to`, rounded down.
fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(60)
}

/// Sink for fired reminders.
pub trait Notifier: Send + Sync {
    /// Deliver one reminder to its recipients.
    fn notify(&self, reminder: &FiredReminder) -> impl Future<Output = ()> + Send;
}

/// Writes each reminder as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, reminder: &FiredReminder) {
        for recipient in &reminder.recipients {
            tracing::info!(
                task_id = %reminder.task_id,
                kind = %reminder.kind,
                recipient = %recipient,
                title = %reminder.title,
                fires_at = %reminder.fires_at,
                "{}",
                reminder.message()
            );
        }
    }
}

/// Forwards reminders over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<FiredReminder>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FiredReminder>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    async fn notify(&self, reminder: &FiredReminder) {
        if self.tx.send(reminder.clone()).is_err() {
            tracing::debug!(task_id = %reminder.task_id, "reminder receiver dropped");
        }
    }
}
