//! Events emitted by the synchronizer.

use std::fmt;

use taskdesk_proto::task::{Task, TaskId};

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The displayed list was replaced from the store.
    ListLoaded {
        /// Number of tasks now displayed.
        count: usize,
    },
    /// The store created a task.
    TaskCreated(Task),
    /// The store confirmed an edit.
    TaskUpdated(Task),
    /// The store confirmed a deletion.
    TaskDeleted(TaskId),
    /// The store confirmed a status change.
    TaskStatusChanged(Task),
    /// An operation failed and local state was restored.
    OperationFailed {
        /// Human-readable cause.
        reason: String,
        /// The task the operation targeted, if any.
        task_id: Option<TaskId>,
    },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListLoaded { count } => write!(f, "loaded {count} tasks"),
            Self::TaskCreated(task) => write!(f, "created \"{}\" ({})", task.title, task.id),
            Self::TaskUpdated(task) => write!(f, "updated \"{}\"", task.title),
            Self::TaskDeleted(id) => write!(f, "deleted {id}"),
            Self::TaskStatusChanged(task) => {
                write!(f, "\"{}\" is now {}", task.title, task.status)
            }
            Self::OperationFailed {
                reason,
                task_id: Some(id),
            } => write!(f, "operation on {id} failed: {reason}"),
            Self::OperationFailed {
                reason,
                task_id: None,
            } => write!(f, "operation failed: {reason}"),
        }
    }
}
