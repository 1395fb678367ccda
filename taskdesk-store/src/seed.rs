//! Demo seed data.

use chrono::{DateTime, TimeDelta, Utc};
use taskdesk_proto::task::{OwnerId, Task, TaskId, TaskPriority, TaskStatus};

/// Three demo tasks relative to `now`: one in progress due in two days, one
/// overdue by a day, and one done due in five days.
#[must_use]
pub fn demo_tasks(now: DateTime<Utc>, owner: &OwnerId) -> Vec<Task> {
    let make = |title: &str,
                description: &str,
                due: TimeDelta,
                priority: TaskPriority,
                status: TaskStatus| Task {
        id: TaskId::new(),
        title: title.to_string(),
        description: Some(description.to_string()),
        due_date: now + due,
        priority,
        status,
        created_at: now,
        updated_at: now,
        owner_id: owner.clone(),
    };

    vec![
        make(
            "Implement task CRUD",
            "Create, read, update and delete operations for tasks.",
            TimeDelta::days(2),
            TaskPriority::High,
            TaskStatus::InProgress,
        ),
        make(
            "Refactor sales components",
            "Remove or adapt the legacy sales widgets.",
            TimeDelta::days(-1),
            TaskPriority::Medium,
            TaskStatus::Todo,
        ),
        make(
            "Update footer",
            "Add the project signature to the main layout.",
            TimeDelta::days(5),
            TaskPriority::Low,
            TaskStatus::Done,
        ),
    ]
}
