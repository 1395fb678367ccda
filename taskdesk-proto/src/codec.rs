//! JSON interchange for tasks, drafts and patches.
//!
//! This is the textual record format any backing store or remote API
//! exchanges with the client. Field names are camelCase, enumerations are
//! closed lowercase strings and timestamps use the fixed-width format from
//! [`crate::timestamp`].

use crate::task::{NewTaskDraft, Task, TaskPatch};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The JSON text could not be produced or parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes a [`Task`] as JSON text.
///
/// # Errors
///
/// Returns `CodecError::Json` if serialization fails.
pub fn encode_task(task: &Task) -> Result<String, CodecError> {
    Ok(serde_json::to_string(task)?)
}

/// Decodes a [`Task`] from JSON text.
///
/// Unknown `status` or `priority` strings are rejected.
///
/// # Errors
///
/// Returns `CodecError::Json` if the text is not a valid task record.
pub fn decode_task(text: &str) -> Result<Task, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encodes a task list as a JSON array, preserving order.
///
/// # Errors
///
/// Returns `CodecError::Json` if serialization fails.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Decodes a JSON array of tasks.
///
/// # Errors
///
/// Returns `CodecError::Json` if any element is invalid.
pub fn decode_tasks(text: &str) -> Result<Vec<Task>, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decodes a creation payload.
///
/// Store-assigned keys (`id`, `createdAt`, `updatedAt`, `ownerId`) are ignored.
///
/// # Errors
///
/// Returns `CodecError::Json` if required fields are missing or malformed.
pub fn decode_draft(text: &str) -> Result<NewTaskDraft, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decodes a partial update payload.
///
/// Immutable keys (`id`, `createdAt`, `updatedAt`, `ownerId`) are ignored.
///
/// # Errors
///
/// Returns `CodecError::Json` if a present field is malformed.
pub fn decode_patch(text: &str) -> Result<TaskPatch, CodecError> {
    Ok(serde_json::from_str(text)?)
}
