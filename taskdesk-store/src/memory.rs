//! Single-process in-memory task store.
//!
//! [`InMemoryTaskStore`] keeps tasks in insertion order behind one
//! [`RwLock`]; every mutation holds the write lock for its whole
//! read-modify-write, which serializes concurrent updates to the same id.
//! Each instance is independent, so tests construct one per case (optionally
//! seeded) instead of sharing global state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::RwLock;

use taskdesk_proto::task::{NewTaskDraft, OwnerId, Task, TaskId, TaskPatch};

use crate::clock::{Clock, SystemClock};
use crate::{StoreError, TaskStore};

/// Default owner stamped on created tasks.
pub const DEFAULT_OWNER: &str = "user-1";

#[derive(Debug, Default)]
struct State {
    /// Live tasks in insertion order.
    tasks: Vec<Task>,
    /// Ids of deleted or reset-away tasks. Never handed out again.
    retired: HashSet<TaskId>,
}

impl State {
    fn is_known(&self, id: &TaskId) -> bool {
        self.retired.contains(id) || self.tasks.iter().any(|t| t.id == *id)
    }

    /// Swaps in `seed` after checking every record. On error nothing changes.
    fn replace(&mut self, seed: Vec<Task>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(seed.len());
        for task in &seed {
            task.validate()?;
            if self.is_known(&task.id) || !seen.insert(&task.id) {
                return Err(StoreError::IdConflict(task.id.clone()));
            }
        }
        let discarded = self.tasks.drain(..).map(|t| t.id);
        self.retired.extend(discarded);
        self.tasks = seed;
        Ok(())
    }
}

/// In-memory reference implementation of [`TaskStore`].
pub struct InMemoryTaskStore {
    state: RwLock<State>,
    owner: OwnerId,
    clock: Arc<dyn Clock>,
    /// Artificial delay applied before every operation.
    latency: Duration,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new(OwnerId::new(DEFAULT_OWNER))
    }
}

impl InMemoryTaskStore {
    /// Creates an empty store that stamps `owner` on every created task.
    #[must_use]
    pub fn new(owner: OwnerId) -> Self {
        Self {
            state: RwLock::new(State::default()),
            owner,
            clock: Arc::new(SystemClock),
            latency: Duration::ZERO,
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Starts the store with `seed` as its contents.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] if a seed task breaks an entity invariant.
    /// - [`StoreError::IdConflict`] if seed ids repeat.
    pub fn with_seed(mut self, seed: Vec<Task>) -> Result<Self, StoreError> {
        self.state.get_mut().replace(seed)?;
        Ok(self)
    }

    /// Delays every operation by `latency`, to exercise asynchronous callers.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The owner stamped on created tasks.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Replaces the whole collection with `seed`.
    ///
    /// Ids of the discarded tasks are retired and will not be assigned again.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] if a seed task breaks an entity invariant.
    /// - [`StoreError::IdConflict`] if a seed id is live, retired or repeated.
    ///
    /// The collection is untouched on error.
    pub async fn reset(&self, seed: Vec<Task>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Err(e) = state.replace(seed) {
            tracing::warn!(error = %e, "rejected store seed");
            return Err(e);
        }
        tracing::debug!(count = state.tasks.len(), "store reset");
        Ok(())
    }

    /// Number of live tasks.
    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    /// Whether the store holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.tasks.is_empty()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl TaskStore for InMemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.simulate_latency().await;
        let mut tasks = self.state.read().await.tasks.clone();
        // Stable: equal due dates keep insertion order.
        tasks.sort_by_key(|t| t.due_date);
        Ok(tasks)
    }

    async fn create(&self, draft: NewTaskDraft) -> Result<Task, StoreError> {
        self.simulate_latency().await;
        if let Err(e) = draft.validate() {
            tracing::warn!(error = %e, "rejected task draft");
            return Err(e.into());
        }

        let mut state = self.state.write().await;
        let id = loop {
            let candidate = TaskId::new();
            if !state.is_known(&candidate) {
                break candidate;
            }
        };
        let now = self.clock.now();
        let task = Task {
            id,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            priority: draft.priority,
            status: draft.status,
            created_at: now,
            updated_at: now,
            owner_id: self.owner.clone(),
        };
        state.tasks.push(task.clone());
        drop(state);

        tracing::info!(task_id = %task.id, due = %task.due_date, "task created");
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        self.simulate_latency().await;
        if let Err(e) = patch.validate() {
            tracing::warn!(task_id = %id, error = %e, "rejected task patch");
            return Err(e.into());
        }

        let mut state = self.state.write().await;
        let Some(task) = state.tasks.iter_mut().find(|t| t.id == *id) else {
            tracing::warn!(task_id = %id, "update of unknown task");
            return Err(StoreError::NotFound(id.clone()));
        };
        task.apply_patch(&patch);
        task.updated_at = self
            .clock
            .now()
            .max(task.updated_at + TimeDelta::milliseconds(1));
        let updated = task.clone();
        drop(state);

        tracing::debug!(task_id = %id, status = %updated.status, "task updated");
        Ok(updated)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;
        let Some(index) = state.tasks.iter().position(|t| t.id == *id) else {
            tracing::warn!(task_id = %id, "delete of unknown task");
            return Err(StoreError::NotFound(id.clone()));
        };
        state.tasks.remove(index);
        state.retired.insert(id.clone());
        drop(state);

        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }
}
