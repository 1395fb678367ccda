//! Failure-injecting store wrapper.
//!
//! [`FlakyStore`] delegates to an inner [`TaskStore`] but can be scripted to
//! fail the next call of a given operation, and counts how many calls each
//! operation received. Tests use it to drive rollback paths and to prove that
//! view-only operations never reach the store.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use parking_lot::Mutex;
use taskdesk_proto::task::{NewTaskDraft, Task, TaskId, TaskPatch};

use crate::{StoreError, TaskStore};

/// The four store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [`TaskStore::list`].
    List,
    /// [`TaskStore::create`].
    Create,
    /// [`TaskStore::update`].
    Update,
    /// [`TaskStore::delete`].
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A name that is not one of the four store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown store operation `{0}` (expected list, create, update, delete)")]
pub struct UnknownStoreOp(pub String);

impl std::str::FromStr for StoreOp {
    type Err = UnknownStoreOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Self::List),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(UnknownStoreOp(other.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    failures: HashMap<StoreOp, VecDeque<StoreError>>,
    calls: HashMap<StoreOp, usize>,
}

/// Wraps a store and fails scripted calls.
pub struct FlakyStore<S> {
    inner: S,
    script: Mutex<Script>,
}

impl<S: TaskStore> FlakyStore<S> {
    /// Wraps `inner` with no scripted failures.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            script: Mutex::new(Script::default()),
        }
    }

    /// The wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Makes the next call of `op` fail with `error` without reaching the
    /// inner store. Repeated calls queue further failures in order.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.script
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Number of calls `op` has received, failed ones included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.script.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Counts the call and pops its scripted failure, if any.
    fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut script = self.script.lock();
        *script.calls.entry(op).or_default() += 1;
        match script.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(error) => {
                tracing::debug!(%op, error = %error, "injecting store failure");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

impl<S: TaskStore> TaskStore for FlakyStore<S> {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.enter(StoreOp::List)?;
        self.inner.list().await
    }

    async fn create(&self, draft: NewTaskDraft) -> Result<Task, StoreError> {
        self.enter(StoreOp::Create)?;
        self.inner.create(draft).await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        self.enter(StoreOp::Update)?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete)?;
        self.inner.delete(id).await
    }
}
