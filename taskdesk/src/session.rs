//! Interactive session: executes prompt commands against a synchronizer.
//!
//! The store sits behind a [`FlakyStore`] so the `fail` command can make
//! the next store call fail and show the rollback paths.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use taskdesk_proto::task::{Task, TaskId};
use taskdesk_proto::timestamp;
use taskdesk_store::{FlakyStore, StoreError, TaskStore};

use crate::command::{Command, FailureKind, HELP};
use crate::form::TaskDialog;
use crate::sync::{SyncConfig, SyncEvent, Synchronizer};
use crate::view::{StatusFilter, TaskView};

/// Result of one command.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Lines to print.
    pub lines: Vec<String>,
    /// Whether the session should end.
    pub quit: bool,
}

impl Outcome {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }
}

/// A synchronizer plus its event stream, driven one command at a time.
pub struct Session<S> {
    sync: Synchronizer<FlakyStore<S>>,
    events: mpsc::Receiver<SyncEvent>,
}

impl<S: TaskStore> Session<S> {
    /// Wraps `store` and builds the synchronizer.
    #[must_use]
    pub fn new(store: S, config: &SyncConfig) -> Self {
        let (sync, events) = Synchronizer::new(FlakyStore::new(store), config);
        Self { sync, events }
    }

    #[must_use]
    pub const fn synchronizer(&self) -> &Synchronizer<FlakyStore<S>> {
        &self.sync
    }

    /// Runs `command`, then appends any sync events it produced.
    pub async fn execute(&mut self, command: Command, now: DateTime<Utc>) -> Outcome {
        let mut outcome = match command {
            Command::List => Outcome {
                lines: render_list(&self.sync.visible(now), self.sync.filter()),
                quit: false,
            },
            Command::Filter(filter) => {
                self.sync.set_filter(filter);
                Outcome {
                    lines: render_list(&self.sync.visible(now), filter),
                    quit: false,
                }
            }
            Command::Reload => match self.sync.load().await {
                Ok(_) => Outcome::default(),
                Err(e) => Outcome::line(format!("reload failed: {e}")),
            },
            Command::Add(form) => {
                let mut dialog = TaskDialog::create();
                *dialog.form_mut() = form;
                match dialog.submit(&self.sync).await {
                    Ok(_) => Outcome::default(),
                    Err(e) => Outcome::line(format!("not added: {e}")),
                }
            }
            Command::Status { handle, status } => match self.resolve(&handle) {
                Ok(task) => match self.sync.change_status(&task.id, status).await {
                    Ok(_) => Outcome::default(),
                    Err(e) => Outcome::line(format!("status unchanged: {e}")),
                },
                Err(message) => Outcome::line(message),
            },
            Command::Edit {
                handle,
                assignments,
            } => match self.resolve(&handle) {
                Ok(task) => self.edit(&task, assignments).await,
                Err(message) => Outcome::line(message),
            },
            Command::Delete { handle } => match self.resolve(&handle) {
                Ok(task) => match self.sync.delete(&task.id).await {
                    Ok(()) => Outcome::default(),
                    Err(e) => Outcome::line(format!("not deleted: {e}")),
                },
                Err(message) => Outcome::line(message),
            },
            Command::Fail { op, kind } => {
                let error = match kind {
                    FailureKind::Transient => {
                        StoreError::Transient("injected failure".to_string())
                    }
                    FailureKind::NotFound => StoreError::NotFound(TaskId::new()),
                };
                self.sync.store().fail_next(op, error);
                Outcome::line(format!("next {op} call will fail"))
            }
            Command::Help => Outcome::line(HELP),
            Command::Quit => Outcome {
                lines: Vec::new(),
                quit: true,
            },
        };

        while let Ok(event) = self.events.try_recv() {
            outcome.lines.push(format!("* {event}"));
        }
        outcome
    }

    async fn edit(&self, task: &Task, assignments: Vec<(String, String)>) -> Outcome {
        let mut dialog = TaskDialog::edit(task);
        for (field, value) in assignments {
            if let Err(e) = dialog.form_mut().set(&field, value) {
                return Outcome::line(e.to_string());
            }
        }
        match dialog.submit(&self.sync).await {
            Ok(_) => Outcome::default(),
            Err(e) => Outcome::line(format!("not saved: {e}")),
        }
    }

    /// The single displayed task `handle` refers to.
    fn resolve(&self, handle: &str) -> Result<Task, String> {
        let mut matches = self.sync.find_by_handle(handle);
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(format!("no displayed task matches `{handle}`")),
            n => Err(format!("`{handle}` matches {n} tasks, use the full id")),
        }
    }
}

fn render_list(views: &[TaskView], filter: StatusFilter) -> Vec<String> {
    if views.is_empty() {
        return vec![format!("no tasks ({filter})")];
    }
    views.iter().map(render_row).collect()
}

fn render_row(view: &TaskView) -> String {
    let task = &view.task;
    let short = task.id.short();
    let marker = if view.overdue { '!' } else { ' ' };
    format!(
        "{marker} {short}  {due}  {priority:<6}  {status:<11}  {title}",
        due = timestamp::format(&task.due_date),
        priority = task.priority.as_str(),
        status = task.status.as_str(),
        title = task.title,
    )
}
