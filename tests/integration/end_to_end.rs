//! End-to-end scenario: a task created through the synchronizer lands in
//! due-date order, and finishing it clears its overdue flag even once the
//! due date has passed.
//!
//! Runs once against the synchronizer API and once through the prompt
//! session, which drives the same path from parsed command lines.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use taskdesk::command::parse;
use taskdesk::session::Session;
use taskdesk::sync::{SyncConfig, SyncEvent, Synchronizer};
use taskdesk::view::StatusFilter;
use taskdesk_proto::task::{NewTaskDraft, OwnerId, TaskPriority, TaskStatus};
use taskdesk_store::{InMemoryTaskStore, ManualClock, TaskStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 14, 9, 0, 0).unwrap()
}

/// A store holding one task due at T+1d and one due at T+5d.
async fn store_with_neighbours() -> InMemoryTaskStore {
    let store = InMemoryTaskStore::new(OwnerId::new("user-1")).with_clock(ManualClock::new(t()));
    store
        .create(NewTaskDraft::new("due tomorrow", t() + TimeDelta::days(1)))
        .await
        .unwrap();
    store
        .create(NewTaskDraft::new("due in five days", t() + TimeDelta::days(5)))
        .await
        .unwrap();
    store
}

// ===========================================================================
// Scenario
// ===========================================================================

#[tokio::test]
async fn create_then_finish_through_synchronizer() {
    let (sync, mut events) =
        Synchronizer::new(store_with_neighbours().await, &SyncConfig::default());
    sync.load().await.unwrap();

    let created = sync
        .create(
            NewTaskDraft::new("Ship A", t() + TimeDelta::days(2)).with_priority(TaskPriority::High),
        )
        .await
        .unwrap();

    let listed = sync.store().list().await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["due tomorrow", "Ship A", "due in five days"]);
    assert_eq!(listed[1], created);
    assert_eq!(sync.tasks(), listed);

    let finished = sync.change_status(&created.id, TaskStatus::Done).await.unwrap();
    let listed = sync.store().list().await.unwrap();
    let stored = listed.iter().find(|t| t.id == created.id).unwrap();
    assert_eq!(stored.status, TaskStatus::Done);
    assert_eq!(stored, &finished);

    // A week later everything is past due; only unfinished tasks are overdue.
    let later = t() + TimeDelta::days(7);
    let view = sync.visible(later);
    let a = view.iter().find(|v| v.task.id == created.id).unwrap();
    assert!(!a.overdue);
    assert_eq!(view.iter().filter(|v| v.overdue).count(), 2);

    sync.set_filter(StatusFilter::Done);
    let done = sync.visible(later);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].task.id, created.id);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        [
            SyncEvent::ListLoaded { count: 2 },
            SyncEvent::TaskCreated(created),
            SyncEvent::ListLoaded { count: 3 },
            SyncEvent::TaskStatusChanged(finished),
        ]
    );
}

#[tokio::test]
async fn create_then_finish_through_prompt() {
    let mut session = Session::new(store_with_neighbours().await, &SyncConfig::default());
    let run = |line: &str| parse(line).unwrap();

    session.execute(run("reload"), t()).await;
    let out = session
        .execute(run("add Ship A | 2026-09-16T09:00:00Z | high | first draft"), t())
        .await;
    assert!(out.lines.iter().any(|l| l.starts_with("* created \"Ship A\"")));

    let tasks = session.synchronizer().tasks();
    assert_eq!(tasks[1].title, "Ship A");
    let handle = tasks[1].id.short();

    let out = session.execute(run(&format!("status {handle} done")), t()).await;
    assert_eq!(out.lines, ["* \"Ship A\" is now done"]);

    let later = t() + TimeDelta::days(7);
    let out = session.execute(run("list"), later).await;
    assert_eq!(out.lines.len(), 3);
    let row_a = out.lines.iter().find(|l| l.ends_with("  Ship A")).unwrap();
    assert!(row_a.starts_with(' '));
    assert_eq!(out.lines.iter().filter(|l| l.starts_with('!')).count(), 2);

    let out = session.execute(run("filter done"), later).await;
    assert_eq!(out.lines.len(), 1);
    assert!(out.lines[0].ends_with("  Ship A"));
}
