//! Reminder kinds and the notification window arithmetic.
//!
//! A task can trigger up to two independent reminders: one for its due
//! date and one for its explicit reminder time. Each kind is tracked
//! separately in the task's fired-reminder ledger.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::task::Task;

/// Default lead time: a reminder fires once its time is this close.
pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// Which timestamp of a task a reminder refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Fired from the task's `due_at`.
    DueDate,
    /// Fired from the task's `remind_at`.
    CustomReminder,
}

impl ReminderKind {
    /// Every kind, in ledger order.
    pub const ALL: [Self; 2] = [Self::DueDate, Self::CustomReminder];

    /// Ledger tag of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DueDate => "due_date",
            Self::CustomReminder => "custom_reminder",
        }
    }

    /// Human-readable notice for a reminder `minutes` away.
    #[must_use]
    pub fn message(self, minutes: i64) -> String {
        match self {
            Self::DueDate => format!("Due in {minutes} minutes"),
            Self::CustomReminder => format!("Reminder: {minutes} minutes until your todo"),
        }
    }
}

impl FromStr for ReminderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "due_date" => Ok(Self::DueDate),
            "custom_reminder" => Ok(Self::CustomReminder),
            other => Err(ValidationError::UnknownReminderKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed interval `[now, now + lead]` in which reminders fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    lead: Duration,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self::minutes(DEFAULT_WINDOW_MINUTES)
    }
}

impl ReminderWindow {
    /// Window with an explicit lead time.
    #[must_use]
    pub const fn new(lead: Duration) -> Self {
        Self { lead }
    }

    /// Window of `minutes` minutes, saturating at the largest span
    /// chrono can represent.
    #[must_use]
    pub fn minutes(minutes: i64) -> Self {
        Self::new(Duration::try_minutes(minutes).unwrap_or(Duration::MAX))
    }

    /// The lead time.
    #[must_use]
    pub const fn lead(&self) -> Duration {
        self.lead
    }

    /// Upper bound of the window starting at `now`. Clamps to the latest
    /// representable instant instead of overflowing.
    #[must_use]
    pub fn end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.lead)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `at` falls inside `[now, now + lead]`.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        now <= at && at <= self.end(now)
    }

    /// Kinds of `task` whose timestamp falls inside the window, with the
    /// time each one refers to.
    ///
    /// Completed tasks never produce reminders. The fired ledger is not
    /// consulted here.
    #[must_use]
    pub fn due_kinds(&self, task: &Task, now: DateTime<Utc>) -> Vec<(ReminderKind, DateTime<Utc>)> {
        if task.completed {
            return Vec::new();
        }
        ReminderKind::ALL
            .into_iter()
            .filter_map(|kind| task.reminder_time(kind).map(|at| (kind, at)))
            .filter(|(_, at)| self.contains(now, *at))
            .collect()
    }
}
