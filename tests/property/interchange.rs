//! Property tests for the task interchange format.
//!
//! Verifies:
//! 1. Any task with millisecond-precision timestamps survives encode → decode.
//! 2. Arbitrary text never panics the decoders (returns `Err` gracefully).
//! 3. The textual timestamp format sorts the same way the instants do.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use taskdesk_proto::codec;
use taskdesk_proto::task::{OwnerId, Task, TaskId, TaskPriority, TaskStatus};
use taskdesk_proto::timestamp;
use uuid::Uuid;

/// Millisecond instants between 1970 and 9999 (four-digit years).
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..253_402_300_799_999).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    })
}

fn arb_priority() -> impl Strategy<Value = TaskPriority> {
    prop_oneof![
        Just(TaskPriority::Low),
        Just(TaskPriority::Medium),
        Just(TaskPriority::High),
    ]
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<u128>(),
        "[^\x00]{2,64}",
        proptest::option::of("[^\x00]{0,128}"),
        arb_instant(),
        arb_priority(),
        arb_status(),
        arb_instant(),
        "[a-z0-9-]{1,16}",
    )
        .prop_map(
            |(id, title, description, due_date, priority, status, created_at, owner)| Task {
                id: TaskId::from_uuid(Uuid::from_u128(id)),
                title,
                description,
                due_date,
                priority,
                status,
                created_at,
                updated_at: created_at,
                owner_id: OwnerId::new(owner),
            },
        )
}

proptest! {
    #[test]
    fn task_survives_interchange(task in arb_task()) {
        let text = codec::encode_task(&task).unwrap();
        prop_assert_eq!(codec::decode_task(&text).unwrap(), task);
    }

    #[test]
    fn decoders_never_panic(text in ".*") {
        let _ = codec::decode_task(&text);
        let _ = codec::decode_tasks(&text);
        let _ = codec::decode_patch(&text);
        let _ = codec::decode_draft(&text);
    }

    #[test]
    fn textual_order_matches_chronological_order(a in arb_instant(), b in arb_instant()) {
        let (ta, tb) = (timestamp::format(&a), timestamp::format(&b));
        prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
    }
}
