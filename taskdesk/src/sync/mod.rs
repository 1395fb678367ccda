//! Client-side synchronization between the displayed task list and the store.
//!
//! The [`Synchronizer`] owns a derived, possibly stale copy of the store's
//! task list. Status changes are applied optimistically and rolled back to a
//! point-in-time snapshot on failure; creations trigger a full reload so the
//! store's ordering stays authoritative; edits and deletions patch the local
//! copy only after the store confirms them. Every outcome is reported as a
//! [`SyncEvent`] for the UI layer.

pub mod event;
pub mod synchronizer;

pub use event::SyncEvent;
pub use synchronizer::Synchronizer;

use std::time::Duration;

use taskdesk_proto::task::{Task, TaskId};
use taskdesk_store::StoreError;

/// Errors surfaced by synchronizer operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The store rejected or failed the operation. Local state was restored.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The task is not in the displayed list, so there is nothing to act on.
    #[error("task {0} is not in the displayed list")]
    NotDisplayed(TaskId),

    /// The task was created, but reloading the list afterwards failed.
    /// The displayed list is unchanged and may be stale.
    #[error("task was created but reloading the list failed: {source}")]
    ReloadFailed {
        /// The task the store created.
        created: Box<Task>,
        /// Why the reload failed.
        source: StoreError,
    },
}

/// Synchronizer settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on any single store call; `None` waits indefinitely.
    /// An elapsed timeout is handled like any other transient failure.
    pub store_timeout: Option<Duration>,
    /// Capacity of the [`SyncEvent`] channel.
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store_timeout: Some(Duration::from_secs(10)),
            event_buffer: 64,
        }
    }
}
