//! `todoshare` engine library.
//!
//! Owns the rules around shared tasks: who may read, edit, delete or
//! re-share a task, and the background scanner that turns approaching
//! due dates and reminder times into exactly-once notifications.
//! Persistence and the user directory are collaborators behind traits;
//! in-memory implementations are provided for embedding and tests.

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
mod locks;
pub mod reminders;
pub mod seed;
pub mod sharing;
pub mod store;
pub mod tasks;

pub use engine::Engine;
pub use error::TaskError;
