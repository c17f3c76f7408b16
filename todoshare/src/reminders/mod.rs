//! Reminder subsystem.
//!
//! The [`ReminderScanner`] periodically finds tasks whose due date or
//! custom reminder time is about to arrive and notifies everyone who can
//! see the task, exactly once per kind. The per-task record of what has
//! already fired is the [`DedupLedger`]. [`ReminderQueries`] answers
//! "what is coming up" and "what is overdue" for a single user.

pub mod ledger;
pub mod notifier;
pub mod queries;
pub mod scanner;

pub use ledger::DedupLedger;
pub use notifier::{ChannelNotifier, FiredReminder, LogNotifier, Notifier};
pub use queries::{ReminderQueries, UpcomingReminder};
pub use scanner::{ReminderScanner, ScanReport, ScannerHandle};
