//! The [`Synchronizer`]: displayed list, optimistic status changes, rollback.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use taskdesk_proto::task::{NewTaskDraft, Task, TaskId, TaskPatch, TaskStatus};
use taskdesk_store::{StoreError, TaskStore};

use super::{SyncConfig, SyncError, SyncEvent};
use crate::view::{StatusFilter, TaskView, derive_view};

/// The displayed list plus a counter bumped by every write to it.
///
/// A rollback compares generations to tell whether anything else changed the
/// list while its store call was in flight.
#[derive(Debug, Default)]
struct Displayed {
    tasks: Vec<Task>,
    generation: u64,
}

impl Displayed {
    /// Mutable access to the list; counts as a write.
    fn write(&mut self) -> &mut Vec<Task> {
        self.generation += 1;
        &mut self.tasks
    }
}

/// List state captured before an optimistic change.
struct Snapshot {
    tasks: Vec<Task>,
    /// Generation right after the optimistic change was applied.
    generation: u64,
}

/// Keeps a displayed copy of the store's tasks in step with the store.
///
/// The displayed list lives behind a synchronous lock that is never held
/// across a store call, so views can be read while a call is in flight.
/// Operations are not retried; a failed call leaves the displayed list as it
/// was before the operation started.
pub struct Synchronizer<S> {
    store: S,
    displayed: Mutex<Displayed>,
    filter: Mutex<StatusFilter>,
    store_timeout: Option<Duration>,
    event_tx: mpsc::Sender<SyncEvent>,
}

impl<S: TaskStore> Synchronizer<S> {
    /// Creates a synchronizer with an empty displayed list.
    ///
    /// Returns the synchronizer and the receiving end of its event channel.
    #[must_use]
    pub fn new(store: S, config: &SyncConfig) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let sync = Self {
            store,
            displayed: Mutex::new(Displayed::default()),
            filter: Mutex::new(StatusFilter::All),
            store_timeout: config.store_timeout,
            event_tx,
        };
        (sync, event_rx)
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the displayed list with the store's current contents.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if listing fails; the previous list is kept.
    pub async fn load(&self) -> Result<usize, SyncError> {
        match self.call(self.store.list()).await {
            Ok(tasks) => Ok(self.replace_all(tasks)),
            Err(e) => {
                self.report_failure(&e, None);
                Err(e.into())
            }
        }
    }

    /// Creates a task, then reloads the full list so the new task appears in
    /// the store's due-date position.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Store`] if creation fails; the displayed list is unchanged.
    /// - [`SyncError::ReloadFailed`] if the task was created but the follow-up
    ///   reload failed.
    pub async fn create(&self, draft: NewTaskDraft) -> Result<Task, SyncError> {
        let created = match self.call(self.store.create(draft)).await {
            Ok(task) => task,
            Err(e) => {
                self.report_failure(&e, None);
                return Err(e.into());
            }
        };
        tracing::info!(task_id = %created.id, title = %created.title, "task created");
        self.emit(SyncEvent::TaskCreated(created.clone()));

        match self.call(self.store.list()).await {
            Ok(tasks) => {
                self.replace_all(tasks);
                Ok(created)
            }
            Err(e) => {
                self.report_failure(&e, Some(&created.id));
                Err(SyncError::ReloadFailed {
                    created: Box::new(created),
                    source: e,
                })
            }
        }
    }

    /// Changes a task's status.
    ///
    /// The new status is shown immediately. If the store rejects the change
    /// and nothing else touched the displayed list meanwhile, the list is
    /// restored to exactly what it was before the call. If other confirmed
    /// operations landed in between, they are kept and only this task's
    /// status is put back. If the store reports the task missing, the stale
    /// record is removed as well.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotDisplayed`] if `id` is not displayed; the store is not called.
    /// - [`SyncError::Store`] if the store call fails.
    pub async fn change_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, SyncError> {
        let snapshot = {
            let mut displayed = self.displayed.lock();
            let Some(index) = displayed.tasks.iter().position(|t| t.id == *id) else {
                return Err(SyncError::NotDisplayed(id.clone()));
            };
            let tasks = displayed.tasks.clone();
            displayed.write()[index].status = status;
            Snapshot {
                tasks,
                generation: displayed.generation,
            }
        };
        tracing::debug!(task_id = %id, %status, "optimistic status applied");

        match self.call(self.store.update(id, TaskPatch::status(status))).await {
            Ok(task) => {
                self.replace_one(&task);
                tracing::info!(task_id = %id, %status, "status change confirmed");
                self.emit(SyncEvent::TaskStatusChanged(task.clone()));
                Ok(task)
            }
            Err(e) => {
                self.roll_back(id, status, snapshot);
                if matches!(e, StoreError::NotFound(_)) {
                    self.drop_stale(id);
                }
                self.report_failure(&e, Some(id));
                Err(e.into())
            }
        }
    }

    /// Applies `patch` to a task once the store confirms it.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotDisplayed`] if `id` is not displayed.
    /// - [`SyncError::Store`] if the store call fails; a `NotFound` failure
    ///   removes the stale record from the displayed list.
    pub async fn edit(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, SyncError> {
        self.ensure_displayed(id)?;

        match self.call(self.store.update(id, patch)).await {
            Ok(task) => {
                self.replace_one(&task);
                tracing::info!(task_id = %id, "task updated");
                self.emit(SyncEvent::TaskUpdated(task.clone()));
                Ok(task)
            }
            Err(e) => {
                if matches!(e, StoreError::NotFound(_)) {
                    self.drop_stale(id);
                }
                self.report_failure(&e, Some(id));
                Err(e.into())
            }
        }
    }

    /// Deletes a task and removes it from the displayed list once the store
    /// confirms.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotDisplayed`] if `id` is not displayed.
    /// - [`SyncError::Store`] if the store call fails; the record stays
    ///   displayed unless the store reported it missing.
    pub async fn delete(&self, id: &TaskId) -> Result<(), SyncError> {
        self.ensure_displayed(id)?;

        match self.call(self.store.delete(id)).await {
            Ok(()) => {
                self.displayed.lock().write().retain(|t| t.id != *id);
                tracing::info!(task_id = %id, "task deleted");
                self.emit(SyncEvent::TaskDeleted(id.clone()));
                Ok(())
            }
            Err(e) => {
                if matches!(e, StoreError::NotFound(_)) {
                    self.drop_stale(id);
                }
                self.report_failure(&e, Some(id));
                Err(e.into())
            }
        }
    }

    /// A copy of the displayed list, in store order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.displayed.lock().tasks.clone()
    }

    /// Selects which statuses [`visible`](Self::visible) shows.
    pub fn set_filter(&self, filter: StatusFilter) {
        *self.filter.lock() = filter;
        tracing::debug!(%filter, "filter changed");
    }

    /// The current filter.
    #[must_use]
    pub fn filter(&self) -> StatusFilter {
        *self.filter.lock()
    }

    /// The filtered displayed list with overdue flags computed against `now`.
    #[must_use]
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<TaskView> {
        let filter = self.filter();
        derive_view(&self.displayed.lock().tasks, filter, now)
    }

    /// Displayed tasks whose id starts with `handle` or ends with it, so both
    /// a prefix of the full id and the [`TaskId::short`] handle resolve.
    #[must_use]
    pub fn find_by_handle(&self, handle: &str) -> Vec<Task> {
        let handle = handle.to_ascii_lowercase();
        self.displayed
            .lock()
            .tasks
            .iter()
            .filter(|t| {
                let id = t.id.to_string();
                id.starts_with(&handle) || id.ends_with(&handle)
            })
            .cloned()
            .collect()
    }

    /// Awaits a store call, bounded by the configured timeout.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let Some(limit) = self.store_timeout else {
            return request.await;
        };
        tokio::time::timeout(limit, request).await.unwrap_or_else(|_| {
            tracing::warn!(timeout_ms = limit.as_millis(), "store call timed out");
            Err(StoreError::Transient(format!(
                "no response within {}ms",
                limit.as_millis()
            )))
        })
    }

    fn ensure_displayed(&self, id: &TaskId) -> Result<(), SyncError> {
        if self.displayed.lock().tasks.iter().any(|t| t.id == *id) {
            Ok(())
        } else {
            Err(SyncError::NotDisplayed(id.clone()))
        }
    }

    fn replace_all(&self, tasks: Vec<Task>) -> usize {
        let count = tasks.len();
        *self.displayed.lock().write() = tasks;
        tracing::debug!(count, "displayed list replaced");
        self.emit(SyncEvent::ListLoaded { count });
        count
    }

    /// Swaps in the store's record for an already displayed task, in place.
    fn replace_one(&self, task: &Task) {
        let mut displayed = self.displayed.lock();
        if let Some(slot) = displayed.write().iter_mut().find(|t| t.id == task.id) {
            *slot = task.clone();
        }
    }

    /// Undoes an optimistic status change after the store refused it.
    fn roll_back(&self, id: &TaskId, attempted: TaskStatus, snapshot: Snapshot) {
        let mut displayed = self.displayed.lock();
        if displayed.generation == snapshot.generation {
            *displayed.write() = snapshot.tasks;
            tracing::debug!(task_id = %id, "status change rolled back");
            return;
        }

        // Other writes landed meanwhile. Keep them and only revert this
        // task, unless a newer authoritative record already replaced ours.
        let previous = snapshot
            .tasks
            .into_iter()
            .find(|t| t.id == *id)
            .map(|t| t.status);
        let slot = displayed
            .write()
            .iter_mut()
            .find(|t| t.id == *id && t.status == attempted);
        if let (Some(slot), Some(previous)) = (slot, previous) {
            slot.status = previous;
        }
        tracing::debug!(task_id = %id, "status change rolled back on a changed list");
    }

    fn drop_stale(&self, id: &TaskId) {
        self.displayed.lock().write().retain(|t| t.id != *id);
        tracing::debug!(task_id = %id, "dropped record the store no longer has");
    }

    fn report_failure(&self, error: &StoreError, task_id: Option<&TaskId>) {
        match task_id {
            Some(id) => tracing::warn!(task_id = %id, error = %error, "store operation failed"),
            None => tracing::warn!(error = %error, "store operation failed"),
        }
        self.emit(SyncEvent::OperationFailed {
            reason: error.to_string(),
            task_id: task_id.cloned(),
        });
    }

    fn emit(&self, event: SyncEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            tracing::debug!("sync event dropped: {e}");
        }
    }
}
