//! Task store contract for `taskdesk`.
//!
//! The [`TaskStore`] trait is the single source of truth the client talks
//! to. Any backing technology must honor the same rules:
//!
//! - `list` returns every task ordered by ascending due date and reflects
//!   every prior successful mutation.
//! - `create` validates the draft, assigns a never-used id, timestamps and
//!   owner, and returns the full persisted record.
//! - `update` merges a partial update, refreshes `updated_at` (strictly
//!   increasing) and returns the full record; `id`, `created_at` and the
//!   owner never change.
//! - `update` and `delete` on an absent id fail with
//!   [`StoreError::NotFound`] and leave the collection untouched. A second
//!   `delete` of the same id fails too.
//!
//! Implementations:
//! - [`memory::InMemoryTaskStore`]: single-process reference store
//! - [`flaky::FlakyStore`]: failure-injecting wrapper for tests and demos

pub mod clock;
pub mod flaky;
pub mod memory;
pub mod seed;

use std::future::Future;
use std::sync::Arc;

use taskdesk_proto::task::{NewTaskDraft, Task, TaskId, TaskPatch, ValidationError};

pub use clock::{Clock, ManualClock, SystemClock};
pub use flaky::{FlakyStore, StoreOp, UnknownStoreOp};
pub use memory::InMemoryTaskStore;

/// Errors a store operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The payload violates an entity invariant. Nothing was applied.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No task with this id exists (never did, or was deleted).
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Seed data reuses an id that is live, retired, or repeated in the seed.
    #[error("task id already used: {0}")]
    IdConflict(TaskId),

    /// Network or timeout-class failure; the operation may be retried.
    #[error("store unavailable: {0}")]
    Transient(String),
}

impl StoreError {
    /// Whether retrying the same call could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The authoritative task collection.
///
/// Every operation is atomic with respect to its caller: two updates on the
/// same id never interleave.
pub trait TaskStore: Send + Sync {
    /// All tasks, ascending by due date (ties keep a stable order).
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Persists a new task built from `draft`.
    fn create(
        &self,
        draft: NewTaskDraft,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Merges `patch` into the task with `id`.
    fn update(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Removes the task with `id`. Irreversible.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: TaskStore> TaskStore for Arc<S> {
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send {
        (**self).list()
    }

    fn create(
        &self,
        draft: NewTaskDraft,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send {
        (**self).create(draft)
    }

    fn update(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send {
        (**self).update(id, patch)
    }

    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).delete(id)
    }
}
