//! The task record and its creation/edit inputs.
//!
//! Share grants and the fired-reminder ledger are private to the record:
//! they change only through [`TaskUpdate`](crate::update::TaskUpdate), which
//! is what keeps grant uniqueness and the shared flag consistent.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::reminder::ReminderKind;
use crate::share::ShareGrant;
use crate::user::UserId;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Task category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    Education,
    #[default]
    General,
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "work" => Ok(Self::Work),
            "personal" => Ok(Self::Personal),
            "shopping" => Ok(Self::Shopping),
            "health" => Ok(Self::Health),
            "education" => Ok(Self::Education),
            "general" => Ok(Self::General),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// A shareable, remindable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (UUID v7, time-ordered).
    pub id: TaskId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Account that controls deletion and sharing.
    pub owner: UserId,
    /// Account that created the record; informational.
    pub creator: UserId,
    /// Whether the task is done.
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    /// Trimmed, de-duplicated tags.
    pub tags: Vec<String>,
    /// When the task is due.
    pub due_at: Option<DateTime<Utc>>,
    /// Explicit reminder time.
    pub remind_at: Option<DateTime<Utc>>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When any field last changed.
    pub updated_at: DateTime<Utc>,
    shares: Vec<ShareGrant>,
    reminders_fired: BTreeSet<ReminderKind>,
}

impl Task {
    /// Builds a new, unshared task from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the draft's title or tags are invalid.
    pub fn new(
        owner: UserId,
        creator: UserId,
        draft: TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = normalize_title(&draft.title)?;
        let tags = normalize_tags(draft.tags)?;
        Ok(Self {
            id: TaskId::new(),
            title,
            description: normalize_description(draft.description),
            owner,
            creator,
            completed: false,
            priority: draft.priority,
            category: draft.category,
            tags,
            due_at: draft.due_at,
            remind_at: draft.remind_at,
            created_at: now,
            updated_at: now,
            shares: Vec::new(),
            reminders_fired: BTreeSet::new(),
        })
    }

    /// Grants on this task, in the order they were created.
    #[must_use]
    pub fn shares(&self) -> &[ShareGrant] {
        &self.shares
    }

    /// Whether the task has at least one grant.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        !self.shares.is_empty()
    }

    /// The grant held by `user`, if any.
    #[must_use]
    pub fn grant_for(&self, user: &UserId) -> Option<&ShareGrant> {
        self.shares.iter().find(|g| &g.grantee == user)
    }

    /// Reminder kinds already notified for this task.
    #[must_use]
    pub const fn reminders_fired(&self) -> &BTreeSet<ReminderKind> {
        &self.reminders_fired
    }

    /// Whether `kind` has already been notified.
    #[must_use]
    pub fn has_fired(&self, kind: ReminderKind) -> bool {
        self.reminders_fired.contains(&kind)
    }

    /// The timestamp a reminder kind refers to.
    #[must_use]
    pub const fn reminder_time(&self, kind: ReminderKind) -> Option<DateTime<Utc>> {
        match kind {
            ReminderKind::DueDate => self.due_at,
            ReminderKind::CustomReminder => self.remind_at,
        }
    }

    /// Owner followed by every grantee.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        std::iter::once(self.owner.clone())
            .chain(self.shares.iter().map(|g| g.grantee.clone()))
            .collect()
    }

    pub(crate) fn shares_mut(&mut self) -> &mut Vec<ShareGrant> {
        &mut self.shares
    }

    pub(crate) fn reminders_fired_mut(&mut self) -> &mut BTreeSet<ReminderKind> {
        &mut self.reminders_fired
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Category,
    pub tags: Vec<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub remind_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Draft with a title and defaults for everything else.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the due time.
    #[must_use]
    pub fn due_at(mut self, at: DateTime<Utc>) -> Self {
        self.due_at = Some(at);
        self
    }

    /// Sets the reminder time.
    #[must_use]
    pub fn remind_at(mut self, at: DateTime<Utc>) -> Self {
        self.remind_at = Some(at);
        self
    }
}

/// Field edits applied to an existing task.
///
/// `None` leaves a field untouched. For clearable fields the inner
/// `Option` distinguishes "set to" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub remind_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Normalizes the patch the same way [`Task::new`] normalizes a draft.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a new title or tag is invalid.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            description: self.description.map(normalize_description),
            tags: self.tags.map(normalize_tags).transpose()?,
            ..self
        })
    }

    /// Whether the patch touches the timestamp a reminder kind refers to.
    #[must_use]
    pub const fn reschedules(&self, kind: ReminderKind) -> bool {
        match kind {
            ReminderKind::DueDate => self.due_at.is_some(),
            ReminderKind::CustomReminder => self.remind_at.is_some(),
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ValidationError::TagEmpty);
        }
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    Ok(out)
}
