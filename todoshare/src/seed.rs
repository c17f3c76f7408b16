//! JSON fixtures for demos and local runs.
//!
//! A seed lists directory users and tasks. Task times are given relative
//! to the moment the seed is applied, so a fixture stays useful no matter
//! when it is loaded. Everything goes through the public engine
//! operations, so seeded data obeys the same rules as live data.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use todoshare_model::{Category, Permission, Priority, TaskDraft, UserId, UserRef};

use crate::directory::InMemoryDirectory;
use crate::engine::Engine;
use crate::error::TaskError;
use crate::sharing::Grantee;
use crate::store::TaskStore;

/// Errors that can occur while loading or applying a seed.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Failed to read the seed file.
    #[error("failed to read seed file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The seed is not valid JSON or does not match the expected shape.
    #[error("failed to parse seed: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value in the seed cannot be turned into a task.
    #[error("invalid seed: {0}")]
    Invalid(String),

    /// An engine operation rejected part of the seed.
    #[error("failed to apply seed: {0}")]
    Apply(#[from] TaskError),
}

/// Parsed seed document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Seed {
    pub users: Vec<UserRef>,
    pub tasks: Vec<SeedTask>,
}

/// One task in a seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedTask {
    pub owner: UserId,
    /// Defaults to the owner.
    #[serde(default)]
    pub creator: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    /// Minutes from application time; negative values lie in the past.
    #[serde(default)]
    pub due_in_minutes: Option<i64>,
    #[serde(default)]
    pub remind_in_minutes: Option<i64>,
    #[serde(default)]
    pub shares: Vec<SeedShare>,
}

/// A grant created by the task's owner while seeding.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedShare {
    /// User id, or an e-mail address if it contains `@`.
    pub grantee: String,
    #[serde(default)]
    pub permission: Permission,
}

/// Counts of what a seed created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub tasks: usize,
    pub shares: usize,
}

impl Seed {
    /// Reads and parses a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Read`] or [`SeedError::Parse`].
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SeedError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parses a seed from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Parse`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Registers the users and creates the tasks, with times relative to
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Invalid`] for a relative time outside the
    /// representable range, or [`SeedError::Apply`] on the first rejected
    /// operation. Everything applied before it stays in place.
    pub async fn apply<S: TaskStore>(
        &self,
        engine: &Engine<S, InMemoryDirectory>,
        now: DateTime<Utc>,
    ) -> Result<SeedSummary, SeedError> {
        let mut summary = SeedSummary::default();

        for user in &self.users {
            engine.directory().add(user.clone());
            summary.users += 1;
        }

        for seed in &self.tasks {
            let creator = seed.creator.as_ref().unwrap_or(&seed.owner);
            let task = engine
                .tasks()
                .create_for(creator, &seed.owner, seed.draft(now)?)
                .await?;
            if seed.completed {
                engine
                    .tasks()
                    .set_completed(&task.id, &seed.owner, true)
                    .await?;
            }
            for share in &seed.shares {
                let grantee = Grantee::parse(&share.grantee).map_err(TaskError::from)?;
                engine
                    .sharing()
                    .share(&task.id, &seed.owner, &grantee, share.permission)
                    .await?;
                summary.shares += 1;
            }
            summary.tasks += 1;
        }

        tracing::info!(
            users = summary.users,
            tasks = summary.tasks,
            shares = summary.shares,
            "seed applied"
        );
        Ok(summary)
    }
}

impl SeedTask {
    fn draft(&self, now: DateTime<Utc>) -> Result<TaskDraft, SeedError> {
        Ok(TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            category: self.category,
            tags: self.tags.clone(),
            due_at: offset(now, self.due_in_minutes, "due_in_minutes")?,
            remind_at: offset(now, self.remind_in_minutes, "remind_in_minutes")?,
        })
    }
}

fn offset(
    now: DateTime<Utc>,
    minutes: Option<i64>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, SeedError> {
    let Some(minutes) = minutes else {
        return Ok(None);
    };
    Duration::try_minutes(minutes)
        .and_then(|lead| now.checked_add_signed(lead))
        .map(Some)
        .ok_or_else(|| SeedError::Invalid(format!("{field} out of range: {minutes}")))
}
