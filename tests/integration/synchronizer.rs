//! Integration tests for the client synchronizer.
//!
//! Covers optimistic status changes and their exact rollback, the
//! reload-after-create rule, confirm-before-apply edits and deletions,
//! stale-record reconciliation on `NotFound`, store timeouts, and
//! view-only filtering.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use taskdesk::sync::{SyncConfig, SyncError, SyncEvent, Synchronizer};
use taskdesk::view::StatusFilter;
use taskdesk_proto::task::{
    NewTaskDraft, OwnerId, Task, TaskId, TaskPatch, TaskPriority, TaskStatus,
};
use taskdesk_store::seed::demo_tasks;
use taskdesk_store::{FlakyStore, InMemoryTaskStore, ManualClock, StoreError, StoreOp, TaskStore};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Store = FlakyStore<InMemoryTaskStore>;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

fn seeded() -> InMemoryTaskStore {
    let owner = OwnerId::new("user-1");
    InMemoryTaskStore::new(owner.clone())
        .with_clock(ManualClock::new(t0()))
        .with_seed(demo_tasks(t0(), &owner))
        .unwrap()
}

async fn start(
    store: InMemoryTaskStore,
    config: &SyncConfig,
) -> (Synchronizer<Store>, mpsc::Receiver<SyncEvent>) {
    let (sync, mut events) = Synchronizer::new(FlakyStore::new(store), config);
    sync.load().await.expect("initial load");
    drain(&mut events);
    (sync, events)
}

fn drain(events: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn transient() -> StoreError {
    StoreError::Transient("connection reset".to_string())
}

// ===========================================================================
// Optimistic status changes
// ===========================================================================

#[tokio::test]
async fn failed_status_change_restores_list_exactly() {
    let (sync, mut events) = start(seeded(), &SyncConfig::default()).await;

    // Move the list away from its loaded state first so the snapshot is
    // taken from a list that already carries confirmed changes.
    let first = sync.tasks()[0].id.clone();
    sync.change_status(&first, TaskStatus::InProgress).await.unwrap();
    drain(&mut events);

    let before = sync.tasks();
    let target = before[2].id.clone();
    sync.store().fail_next(StoreOp::Update, transient());

    let err = sync.change_status(&target, TaskStatus::Todo).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Transient(_))));
    assert_eq!(sync.tasks(), before);
    assert_eq!(
        drain(&mut events),
        [SyncEvent::OperationFailed {
            reason: "store unavailable: connection reset".to_string(),
            task_id: Some(target),
        }]
    );
}

#[tokio::test]
async fn confirmed_status_change_matches_store() {
    let (sync, mut events) = start(seeded(), &SyncConfig::default()).await;
    let target = sync.tasks()[1].clone();

    let confirmed = sync.change_status(&target.id, TaskStatus::Done).await.unwrap();
    let stored = sync.store().inner().list().await.unwrap();

    assert_eq!(sync.tasks(), stored);
    assert!(confirmed.updated_at > target.updated_at);
    assert_eq!(drain(&mut events), [SyncEvent::TaskStatusChanged(confirmed)]);
}

#[tokio::test]
async fn status_change_on_vanished_task_drops_it() {
    let (sync, mut events) = start(seeded(), &SyncConfig::default()).await;
    let before = sync.tasks();
    let gone = before[0].id.clone();
    sync.store().inner().delete(&gone).await.unwrap();

    let err = sync.change_status(&gone, TaskStatus::Done).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::NotFound(_))));

    let expected: Vec<_> = before.into_iter().filter(|t| t.id != gone).collect();
    assert_eq!(sync.tasks(), expected);
    assert!(matches!(
        drain(&mut events).as_slice(),
        [SyncEvent::OperationFailed { task_id: Some(id), .. }] if *id == gone
    ));
}

/// Delays every update; optionally fails it after the delay instead of
/// applying it. Other operations answer at once.
struct SlowUpdates {
    inner: InMemoryTaskStore,
    delay: Duration,
    fail: bool,
}

impl SlowUpdates {
    const fn new(inner: InMemoryTaskStore, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            fail: false,
        }
    }

    const fn failing(inner: InMemoryTaskStore, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            fail: true,
        }
    }
}

impl TaskStore for SlowUpdates {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.inner.list().await
    }

    async fn create(&self, draft: NewTaskDraft) -> Result<Task, StoreError> {
        self.inner.create(draft).await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(transient());
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_status_change_rolls_back() {
    let config = SyncConfig {
        store_timeout: Some(Duration::from_millis(500)),
        ..SyncConfig::default()
    };
    let (sync, mut events) = Synchronizer::new(SlowUpdates::new(seeded(), Duration::from_secs(30)), &config);
    sync.load().await.unwrap();
    drain(&mut events);
    let before = sync.tasks();
    let target = before[0].id.clone();

    let err = sync.change_status(&target, TaskStatus::Done).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Transient(_))));
    assert_eq!(sync.tasks(), before);
    assert_eq!(sync.store().inner.list().await.unwrap(), before);
    assert!(matches!(
        drain(&mut events).as_slice(),
        [SyncEvent::OperationFailed { task_id: Some(_), .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn rollback_keeps_writes_confirmed_meanwhile() {
    let store = SlowUpdates::failing(seeded(), Duration::from_millis(200));
    let (sync, mut events) = Synchronizer::new(store, &SyncConfig::default());
    sync.load().await.unwrap();
    drain(&mut events);
    let before = sync.tasks();
    let (target, doomed) = (before[0].id.clone(), before[1].id.clone());

    let (changed, created, deleted) = tokio::join!(
        sync.change_status(&target, TaskStatus::Done),
        sync.create(NewTaskDraft::new("Created meanwhile", t0() + TimeDelta::days(3))),
        sync.delete(&doomed),
    );
    assert!(matches!(changed, Err(SyncError::Store(StoreError::Transient(_)))));
    let created = created.unwrap();
    deleted.unwrap();

    let stored = sync.store().inner.list().await.unwrap();
    assert_eq!(sync.tasks(), stored);
    assert!(sync.tasks().contains(&created));
    assert!(sync.tasks().iter().all(|t| t.id != doomed));
    assert_eq!(sync.tasks()[0], before[0]);
}

#[tokio::test(start_paused = true)]
async fn rollback_on_changed_list_reverts_only_the_target() {
    let store = SlowUpdates::failing(seeded(), Duration::from_millis(200));
    let (sync, mut events) = Synchronizer::new(store, &SyncConfig::default());
    sync.load().await.unwrap();
    drain(&mut events);
    let before = sync.tasks();
    let (target, doomed) = (before[0].id.clone(), before[2].id.clone());

    // No reload happens here, so the optimistic status is still displayed
    // when the update fails and has to be reverted in place.
    let (changed, deleted) = tokio::join!(
        sync.change_status(&target, TaskStatus::Done),
        sync.delete(&doomed),
    );
    changed.unwrap_err();
    deleted.unwrap();

    let expected: Vec<Task> = before.into_iter().filter(|t| t.id != doomed).collect();
    assert_eq!(sync.tasks(), expected);
    assert_eq!(sync.tasks(), sync.store().inner.list().await.unwrap());
}

// ===========================================================================
// Create, edit, delete
// ===========================================================================

#[tokio::test]
async fn create_reloads_instead_of_splicing() {
    let (sync, mut events) = start(seeded(), &SyncConfig::default()).await;

    let created = sync
        .create(
            NewTaskDraft::new("Earliest", t0() - TimeDelta::days(3))
                .with_priority(TaskPriority::High),
        )
        .await
        .unwrap();

    assert_eq!(sync.tasks()[0], created);
    assert_eq!(sync.tasks(), sync.store().inner().list().await.unwrap());
    assert_eq!(sync.store().calls(StoreOp::List), 2);
    assert_eq!(
        drain(&mut events),
        [
            SyncEvent::TaskCreated(created),
            SyncEvent::ListLoaded { count: 4 },
        ]
    );
}

#[tokio::test]
async fn rejected_create_leaves_list_untouched() {
    let (sync, mut events) = start(seeded(), &SyncConfig::default()).await;
    let before = sync.tasks();

    let err = sync.create(NewTaskDraft::new("x", t0())).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Validation(_))));
    assert_eq!(sync.tasks(), before);
    assert_eq!(sync.store().calls(StoreOp::List), 1);
    assert!(matches!(
        drain(&mut events).as_slice(),
        [SyncEvent::OperationFailed { task_id: None, .. }]
    ));
}

#[tokio::test]
async fn failed_edit_keeps_previous_record() {
    let (sync, _events) = start(seeded(), &SyncConfig::default()).await;
    let before = sync.tasks();
    let target = before[1].id.clone();
    sync.store().fail_next(StoreOp::Update, transient());

    sync.edit(&target, TaskPatch::default().with_title("Renamed"))
        .await
        .unwrap_err();
    assert_eq!(sync.tasks(), before);
}

#[tokio::test]
async fn edit_on_vanished_task_drops_it() {
    let (sync, _events) = start(seeded(), &SyncConfig::default()).await;
    let gone = sync.tasks()[2].id.clone();
    sync.store().inner().delete(&gone).await.unwrap();

    let err = sync
        .edit(&gone, TaskPatch::default().with_priority(TaskPriority::Low))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::NotFound(_))));
    assert_eq!(sync.tasks().len(), 2);
}

#[tokio::test]
async fn delete_failure_keeps_record_displayed() {
    let (sync, mut events) = start(seeded(), &SyncConfig::default()).await;
    let before = sync.tasks();
    let target = before[0].id.clone();
    sync.store().fail_next(StoreOp::Delete, transient());

    sync.delete(&target).await.unwrap_err();
    assert_eq!(sync.tasks(), before);
    assert_eq!(drain(&mut events).len(), 1);

    sync.delete(&target).await.unwrap();
    assert!(sync.tasks().iter().all(|t| t.id != target));
    assert_eq!(drain(&mut events), [SyncEvent::TaskDeleted(target)]);
}

// ===========================================================================
// View
// ===========================================================================

#[tokio::test]
async fn switching_filters_needs_no_store_round_trip() {
    let (sync, _events) = start(seeded(), &SyncConfig::default()).await;
    let all = sync.visible(t0());

    sync.set_filter(StatusFilter::Done);
    let done = sync.visible(t0());
    assert!(!done.is_empty());
    assert!(done.iter().all(|v| v.task.status == TaskStatus::Done));

    sync.set_filter(StatusFilter::All);
    assert_eq!(sync.visible(t0()), all);
    assert_eq!(sync.store().calls(StoreOp::List), 1);
    assert_eq!(sync.tasks().len(), 3);
}

#[tokio::test]
async fn overdue_follows_the_clock() {
    let (sync, _events) = start(seeded(), &SyncConfig::default()).await;
    let overdue_now = sync.visible(t0()).iter().filter(|v| v.overdue).count();
    let overdue_later = sync
        .visible(t0() + TimeDelta::days(3))
        .iter()
        .filter(|v| v.overdue)
        .count();
    assert_eq!(overdue_now, 1);
    assert_eq!(overdue_later, 2);
}

#[tokio::test]
async fn dropped_receiver_does_not_break_operations() {
    let (sync, events) = start(seeded(), &SyncConfig::default()).await;
    drop(events);

    let target = sync.tasks()[0].id.clone();
    sync.change_status(&target, TaskStatus::Done).await.unwrap();
    sync.load().await.unwrap();
}
