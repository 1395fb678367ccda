//! Property tests for store ordering and mutation invariants.
//!
//! Applies arbitrary sequences of create / update / delete operations to a
//! fresh in-memory store and checks after every step that `list()` is sorted
//! by due date, that `updated_at >= created_at`, and that ids are unique.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use taskdesk_proto::task::{NewTaskDraft, OwnerId, TaskPatch, TaskStatus};
use taskdesk_store::{InMemoryTaskStore, ManualClock, TaskStore};

#[derive(Debug, Clone)]
enum Op {
    Create { due_offset_hours: i64 },
    MoveDue { pick: usize, due_offset_hours: i64 },
    Finish { pick: usize },
    Delete { pick: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-240i64..240).prop_map(|h| Op::Create { due_offset_hours: h }),
        (any::<usize>(), -240i64..240).prop_map(|(pick, h)| Op::MoveDue {
            pick,
            due_offset_hours: h
        }),
        any::<usize>().prop_map(|pick| Op::Finish { pick }),
        any::<usize>().prop_map(|pick| Op::Delete { pick }),
    ]
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

async fn run(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let clock = ManualClock::new(base());
    let store = InMemoryTaskStore::new(OwnerId::new("user-1")).with_clock(clock.clone());

    for (step, op) in ops.into_iter().enumerate() {
        clock.advance(TimeDelta::seconds(1));
        let current = store.list().await.map_err(|e| TestCaseError::fail(e.to_string()))?;
        let pick = |n: usize| (!current.is_empty()).then(|| current[n % current.len()].id.clone());

        match op {
            Op::Create { due_offset_hours } => {
                let draft = NewTaskDraft::new(
                    format!("task {step}"),
                    base() + TimeDelta::hours(due_offset_hours),
                );
                store
                    .create(draft)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            Op::MoveDue {
                pick: n,
                due_offset_hours,
            } => {
                if let Some(id) = pick(n) {
                    let patch =
                        TaskPatch::default().with_due_date(base() + TimeDelta::hours(due_offset_hours));
                    store
                        .update(&id, patch)
                        .await
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                }
            }
            Op::Finish { pick: n } => {
                if let Some(id) = pick(n) {
                    store
                        .update(&id, TaskPatch::status(TaskStatus::Done))
                        .await
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                }
            }
            Op::Delete { pick: n } => {
                if let Some(id) = pick(n) {
                    store
                        .delete(&id)
                        .await
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                }
            }
        }

        let listed = store.list().await.map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(listed.windows(2).all(|w| w[0].due_date <= w[1].due_date));
        prop_assert!(listed.iter().all(|t| t.updated_at >= t.created_at));
        let ids: HashSet<_> = listed.iter().map(|t| t.id.clone()).collect();
        prop_assert_eq!(ids.len(), listed.len());
    }
    Ok(())
}

proptest! {
    #[test]
    fn list_stays_sorted_under_any_operation_sequence(ops in prop::collection::vec(arb_op(), 0..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        runtime.block_on(run(ops))?;
    }
}
