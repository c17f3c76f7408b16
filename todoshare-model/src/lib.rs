//! Shared data model for `todoshare`.
//!
//! Holds the task record, share grants, reminder kinds and the atomic
//! update vocabulary understood by every task store. Everything here is
//! pure: no I/O, no async, no clock reads except where a caller passes
//! `now` in.

pub mod access;
pub mod error;
pub mod reminder;
pub mod share;
pub mod task;
pub mod update;
pub mod user;

pub use access::{AccessLevel, Action, evaluate};
pub use error::ValidationError;
pub use reminder::{ReminderKind, ReminderWindow};
pub use share::{Permission, ShareGrant};
pub use task::{Category, Priority, Task, TaskDraft, TaskId, TaskPatch};
pub use update::{TaskUpdate, UpdateConflict};
pub use user::{UserId, UserRef};
