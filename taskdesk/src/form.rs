//! Form validation and the create/edit task dialog.
//!
//! A [`TaskForm`] holds the raw text a user typed. [`validate_new`] and
//! [`validate_edit`] turn it into a [`NewTaskDraft`] or a [`TaskPatch`], or
//! report every failing field at once in a [`FieldErrors`]. Nothing is
//! submitted unless the whole form is valid.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use taskdesk_proto::task::{
    MIN_TITLE_LENGTH, NewTaskDraft, Task, TaskId, TaskPatch, TaskPriority, TaskStatus,
};
use taskdesk_proto::timestamp;
use taskdesk_store::TaskStore;

use crate::sync::{SyncError, Synchronizer};

/// Date-time layouts accepted besides RFC 3339, read as UTC.
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Task title.
    Title,
    /// Free-form description.
    Description,
    /// Due date text.
    DueDate,
    /// Priority name.
    Priority,
    /// Status name; edit forms only.
    Status,
}

impl Field {
    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-keyed validation messages, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Records `message` for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Whether every field passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Failing fields and their messages, in form order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// A field name typed at a prompt that the form does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field `{0}`")]
pub struct UnknownField(pub String);

/// Raw form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// Title as typed.
    pub title: String,
    /// Description as typed; blank means none.
    pub description: String,
    /// Due date as typed, see [`parse_due_date`].
    pub due_date: String,
    /// Priority name as typed.
    pub priority: String,
    /// Status name. Only present when editing.
    pub status: Option<String>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            priority: TaskPriority::default().as_str().to_string(),
            status: None,
        }
    }
}

impl TaskForm {
    /// A form pre-filled from an existing task, status included.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: timestamp::format(&task.due_date),
            priority: task.priority.as_str().to_string(),
            status: Some(task.status.as_str().to_string()),
        }
    }

    /// Sets one field from its name, as typed at a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] with the unrecognized name.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<(), UnknownField> {
        let value = value.into();
        match field {
            "title" => self.title = value,
            "description" => self.description = value,
            "due" | "due_date" => self.due_date = value,
            "priority" => self.priority = value,
            "status" => self.status = Some(value),
            other => return Err(UnknownField(other.to_string())),
        }
        Ok(())
    }
}

/// Fields shared by both form variants.
struct Common {
    title: String,
    description: String,
    due_date: DateTime<Utc>,
    priority: TaskPriority,
}

fn check_common(form: &TaskForm, errors: &mut FieldErrors) -> Option<Common> {
    let title = form.title.trim();
    if title.chars().count() < MIN_TITLE_LENGTH {
        errors.insert(
            Field::Title,
            format!("title must be at least {MIN_TITLE_LENGTH} characters"),
        );
    }

    let due_date = parse_due_date(&form.due_date)
        .map_err(|message| errors.insert(Field::DueDate, message))
        .ok();

    let priority = form
        .priority
        .trim()
        .to_ascii_lowercase()
        .parse::<TaskPriority>()
        .map_err(|_| errors.insert(Field::Priority, "priority must be one of low, medium, high"))
        .ok();

    Some(Common {
        title: title.to_string(),
        description: form.description.trim().to_string(),
        due_date: due_date?,
        priority: priority?,
    })
}

/// Validates a creation form. The status field is ignored; new tasks start
/// as `todo`.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_new(form: &TaskForm) -> Result<NewTaskDraft, FieldErrors> {
    let mut errors = FieldErrors::default();
    let common = check_common(form, &mut errors);
    let Some(common) = common.filter(|_| errors.is_empty()) else {
        return Err(errors);
    };

    let mut draft = NewTaskDraft::new(common.title, common.due_date)
        .with_priority(common.priority)
        .with_status(TaskStatus::Todo);
    if !common.description.is_empty() {
        draft = draft.with_description(common.description);
    }
    Ok(draft)
}

/// Validates an edit form into a patch carrying every field. An empty
/// description clears the stored one.
///
/// # Errors
///
/// Returns every failing field; `status` is required.
pub fn validate_edit(form: &TaskForm) -> Result<TaskPatch, FieldErrors> {
    let mut errors = FieldErrors::default();
    let common = check_common(form, &mut errors);

    let status = match form.status.as_deref().map(str::trim) {
        None | Some("") => {
            errors.insert(Field::Status, "status is required");
            None
        }
        Some(text) => text
            .to_ascii_lowercase()
            .parse::<TaskStatus>()
            .map_err(|_| {
                errors.insert(Field::Status, "status must be one of todo, in_progress, done");
            })
            .ok(),
    };

    match (common, status) {
        (Some(common), Some(status)) if errors.is_empty() => Ok(TaskPatch::default()
            .with_title(common.title)
            .with_description(common.description)
            .with_due_date(common.due_date)
            .with_priority(common.priority)
            .with_status(status)),
        _ => Err(errors),
    }
}

/// Parses a typed due date.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC), and `YYYY-MM-DD`
/// (midnight UTC). Years outside 0000 to 9999 are rejected.
///
/// # Errors
///
/// Returns a human-readable message.
pub fn parse_due_date(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("due date is required".to_string());
    }
    let parsed = timestamp::parse(text)
        .ok()
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|parsed| parsed.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
        })
        .ok_or_else(|| format!("`{text}` is not a valid date (use YYYY-MM-DD or RFC 3339)"))?;

    if !timestamp::in_range(&parsed) {
        return Err(format!("`{text}` is out of range (years 0000 to 9999)"));
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Dialog
// ---------------------------------------------------------------------------

/// What a dialog submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    /// Submits a new task.
    Create,
    /// Submits changes to the task with this id.
    Edit(TaskId),
}

/// Why a submission did not go through.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    /// The form has invalid fields; nothing was sent.
    #[error("invalid input: {0}")]
    Invalid(FieldErrors),

    /// The synchronizer reported a failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The dialog was already dismissed.
    #[error("dialog is closed")]
    Closed,
}

/// A create or edit dialog that stays open until the store confirms.
#[derive(Debug, Clone)]
pub struct TaskDialog {
    mode: DialogMode,
    form: TaskForm,
    errors: FieldErrors,
    failure: Option<String>,
    open: bool,
}

impl TaskDialog {
    /// An empty creation dialog.
    #[must_use]
    pub fn create() -> Self {
        Self::open_with(DialogMode::Create, TaskForm::default())
    }

    /// An edit dialog pre-filled from `task`.
    #[must_use]
    pub fn edit(task: &Task) -> Self {
        Self::open_with(DialogMode::Edit(task.id.clone()), TaskForm::from_task(task))
    }

    fn open_with(mode: DialogMode, form: TaskForm) -> Self {
        Self {
            mode,
            form,
            errors: FieldErrors::default(),
            failure: None,
            open: true,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> &DialogMode {
        &self.mode
    }

    #[must_use]
    pub const fn form(&self) -> &TaskForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    /// Field errors from the last submission.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Store failure from the last submission.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Closes without submitting.
    pub fn cancel(&mut self) {
        self.open = false;
    }

    /// Validates the form and sends it through `sync`.
    ///
    /// The dialog closes once the store has confirmed the write. A creation
    /// whose follow-up reload failed still closes, since the task exists.
    ///
    /// # Errors
    ///
    /// - [`DialogError::Invalid`] if any field fails; nothing is sent.
    /// - [`DialogError::Sync`] if the synchronizer reports a failure.
    /// - [`DialogError::Closed`] if the dialog was already dismissed.
    pub async fn submit<S: TaskStore>(&mut self, sync: &Synchronizer<S>) -> Result<Task, DialogError> {
        if !self.open {
            return Err(DialogError::Closed);
        }
        self.failure = None;

        let result = match self.mode.clone() {
            DialogMode::Create => match validate_new(&self.form) {
                Ok(draft) => {
                    self.errors = FieldErrors::default();
                    sync.create(draft).await
                }
                Err(errors) => return Err(self.reject(errors)),
            },
            DialogMode::Edit(id) => match validate_edit(&self.form) {
                Ok(patch) => {
                    self.errors = FieldErrors::default();
                    sync.edit(&id, patch).await
                }
                Err(errors) => return Err(self.reject(errors)),
            },
        };

        match result {
            Ok(task) => {
                self.open = false;
                Ok(task)
            }
            Err(e) => {
                if matches!(e, SyncError::ReloadFailed { .. }) {
                    self.open = false;
                }
                self.failure = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn reject(&mut self, errors: FieldErrors) -> DialogError {
        tracing::debug!(%errors, "form rejected");
        self.errors = errors.clone();
        DialogError::Invalid(errors)
    }
}
