//! Task entity types for `taskdesk`.
//!
//! Defines the persisted [`Task`] record, its closed enumerations, and the two
//! client-supplied payload shapes: [`NewTaskDraft`] for creation (every field
//! required except the description) and [`TaskPatch`] for partial updates
//! (every mutable field optional). Store-assigned fields (`id`, `created_at`,
//! `updated_at`, `owner_id`) never appear in either payload.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timestamp;

/// Minimum task title length in characters, after trimming whitespace.
pub const MIN_TITLE_LENGTH: usize = 2;

/// Hex digits in [`TaskId::short`].
pub const SHORT_ID_LEN: usize = 8;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses the hyphenated textual form.
    ///
    /// # Errors
    ///
    /// Returns a [`uuid::Error`] if `text` is not a UUID.
    pub fn parse(text: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(text).map(Self)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short handle for listings: the last [`SHORT_ID_LEN`] hex digits.
    ///
    /// The leading digits of a v7 UUID encode its creation time, so tasks
    /// created together share them; the trailing ones are random.
    #[must_use]
    pub fn short(&self) -> String {
        let mut hex = self.0.simple().to_string();
        hex.split_off(hex.len() - SHORT_ID_LEN)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the owner of a task. Stamped by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an owner identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when text does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}` (expected one of: {expected})")]
pub struct UnknownVariant {
    /// What was being parsed (`priority`, `status`, ...).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated accepted values.
    pub expected: &'static str,
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Normal priority.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl TaskPriority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the interchange string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "priority",
                value: s.to_string(),
                expected: "low, medium, high",
            })
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Returns the interchange string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
                expected: "todo, in_progress, done",
            })
    }
}

/// Entity invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The trimmed title is shorter than [`MIN_TITLE_LENGTH`].
    #[error("title must be at least {min} characters (got {actual})")]
    TitleTooShort {
        /// Required minimum.
        min: usize,
        /// Length of the trimmed title.
        actual: usize,
    },

    /// A record claims it was last updated before it was created.
    #[error("updated at {updated_at} before it was created at {created_at}")]
    UpdatedBeforeCreated {
        /// Creation time on the record.
        created_at: DateTime<Utc>,
        /// Last-update time on the record.
        updated_at: DateTime<Utc>,
    },
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    let actual = title.trim().chars().count();
    if actual < MIN_TITLE_LENGTH {
        return Err(ValidationError::TitleTooShort {
            min: MIN_TITLE_LENGTH,
            actual,
        });
    }
    Ok(())
}

/// A persisted task as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier, immutable.
    pub id: TaskId,
    /// Task title, at least [`MIN_TITLE_LENGTH`] characters.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// When the task is due.
    #[serde(with = "timestamp")]
    pub due_date: DateTime<Utc>,
    /// Task priority.
    pub priority: TaskPriority,
    /// Workflow status.
    pub status: TaskStatus,
    /// Creation time, immutable.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Time of the last successful mutation; never earlier than `created_at`.
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Owner stamped by the store, immutable.
    pub owner_id: OwnerId,
}

impl Task {
    /// Checks the invariants of a complete record, for data that did not come
    /// through [`NewTaskDraft`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TitleTooShort`] for a short title and
    /// [`ValidationError::UpdatedBeforeCreated`] for inverted audit times.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        if self.updated_at < self.created_at {
            return Err(ValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Whether the task is past due at `now` and not yet done.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != TaskStatus::Done
    }

    /// Merges the fields present in `patch` into this task.
    ///
    /// Identity, creation time, owner and `updated_at` are left alone; the
    /// caller refreshes `updated_at`. An empty description clears it.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description = (!description.is_empty()).then(|| description.clone());
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskDraft {
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// When the task is due.
    #[serde(with = "timestamp")]
    pub due_date: DateTime<Utc>,
    /// Priority, `medium` unless set.
    #[serde(default)]
    pub priority: TaskPriority,
    /// Initial status, `todo` unless set.
    #[serde(default)]
    pub status: TaskStatus,
}

impl NewTaskDraft {
    /// Creates a draft with default priority and status.
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Checks the entity invariants a draft can violate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TitleTooShort`] for a short title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)
    }
}

/// Partial update of a task's mutable fields.
///
/// Keys for `id`, `createdAt`, `updatedAt` and `ownerId` have no field here,
/// so a decoded patch carrying them simply drops them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description; an empty string clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New due date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub due_date: Option<DateTime<Utc>>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// A patch that changes only the status.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }

    /// Checks the invariants of the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TitleTooShort`] if a present title is short.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.title.as_deref().map_or(Ok(()), check_title)
    }
}
