//! Derived view over the displayed task list.
//!
//! Filtering and overdue marking are pure functions of the displayed list,
//! the selected [`StatusFilter`], and the current instant. They never reach
//! the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use taskdesk_proto::task::{Task, TaskStatus, UnknownVariant};

/// Which statuses the view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Only `todo` tasks.
    Todo,
    /// Only `in_progress` tasks.
    InProgress,
    /// Only `done` tasks.
    Done,
}

impl StatusFilter {
    /// Every filter, in menu order.
    pub const ALL: [Self; 4] = [Self::All, Self::Todo, Self::InProgress, Self::Done];

    /// Whether `task` passes this filter.
    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Todo => task.status == TaskStatus::Todo,
            Self::InProgress => task.status == TaskStatus::InProgress,
            Self::Done => task.status == TaskStatus::Done,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "filter",
                value: s.to_string(),
                expected: "all, todo, in_progress, done",
            })
    }
}

/// A displayed task plus its derived overdue flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    /// The displayed record.
    pub task: Task,
    /// Past due and not done at the time the view was derived.
    pub overdue: bool,
}

impl TaskView {
    /// Marks `task` against `now`.
    #[must_use]
    pub fn new(task: Task, now: DateTime<Utc>) -> Self {
        let overdue = task.is_overdue(now);
        Self { task, overdue }
    }
}

/// Filters `tasks` and marks overdue entries, keeping the list order.
#[must_use]
pub fn derive_view(tasks: &[Task], filter: StatusFilter, now: DateTime<Utc>) -> Vec<TaskView> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .map(|task| TaskView::new(task.clone(), now))
        .collect()
}
