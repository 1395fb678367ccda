//! Line commands for the interactive prompt.
//!
//! One command per line; the first word selects the command. Multi-field
//! arguments are separated with `|` so titles and descriptions may contain
//! spaces.

use taskdesk_proto::task::TaskStatus;
use taskdesk_store::StoreOp;

use crate::form::TaskForm;
use crate::view::StatusFilter;

/// Usage summary printed by `help`.
pub const HELP: &str = "\
commands:
  list                                     show tasks (overdue marked with !)
  filter <all|todo|in_progress|done>       change the status filter
  add <title> | <due> [| <priority> [| <description>]]
  status <id> <todo|in_progress|done>
  edit <id> <field>=<value> [| <field>=<value> ...]
  delete <id>
  reload                                   fetch the list from the store
  fail <list|create|update|delete> [transient|notfound]
                                           make the next store call fail
  help
  quit
<id> is the short handle shown by `list` or a prefix of the full id.";

/// Failure to inject with `fail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureKind {
    #[default]
    Transient,
    NotFound,
}

/// A parsed prompt command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Filter(StatusFilter),
    Add(TaskForm),
    Status {
        handle: String,
        status: TaskStatus,
    },
    Edit {
        handle: String,
        assignments: Vec<(String, String)>,
    },
    Delete {
        handle: String,
    },
    Reload,
    Fail {
        op: StoreOp,
        kind: FailureKind,
    },
    Help,
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// First word is not a command.
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    /// Arguments missing or malformed.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// An argument has an unacceptable value.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Parses one prompt line.
///
/// # Errors
///
/// Returns [`CommandError`] describing what is wrong with the line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    match word {
        "" => Err(CommandError::Empty),
        "list" | "ls" => Ok(Command::List),
        "reload" => Ok(Command::Reload),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "filter" => rest
            .parse::<StatusFilter>()
            .map(Command::Filter)
            .map_err(|e| CommandError::InvalidArgument(e.to_string())),
        "add" => parse_add(rest),
        "status" => {
            let Some((handle, status)) = rest.split_once(char::is_whitespace) else {
                return Err(CommandError::Usage("status <id> <todo|in_progress|done>"));
            };
            let status = status
                .trim()
                .parse::<TaskStatus>()
                .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
            Ok(Command::Status {
                handle: handle.to_string(),
                status,
            })
        }
        "edit" => parse_edit(rest),
        "delete" | "rm" => {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                return Err(CommandError::Usage("delete <id>"));
            }
            Ok(Command::Delete {
                handle: rest.to_string(),
            })
        }
        "fail" => parse_fail(rest),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_add(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "add <title> | <due> [| <priority> [| <description>]]";
    let parts: Vec<&str> = rest.splitn(4, '|').map(str::trim).collect();
    let [title, due, extra @ ..] = parts.as_slice() else {
        return Err(CommandError::Usage(USAGE));
    };

    let mut form = TaskForm {
        title: (*title).to_string(),
        due_date: (*due).to_string(),
        ..TaskForm::default()
    };
    if let Some(priority) = extra.first().filter(|p| !p.is_empty()) {
        form.priority = (*priority).to_string();
    }
    if let Some(description) = extra.get(1) {
        form.description = (*description).to_string();
    }
    Ok(Command::Add(form))
}

fn parse_edit(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "edit <id> <field>=<value> [| <field>=<value> ...]";
    let Some((handle, fields)) = rest.split_once(char::is_whitespace) else {
        return Err(CommandError::Usage(USAGE));
    };

    let assignments = fields
        .split('|')
        .map(|pair| {
            pair.split_once('=')
                .map(|(field, value)| (field.trim().to_string(), value.trim().to_string()))
                .ok_or(CommandError::Usage(USAGE))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Command::Edit {
        handle: handle.to_string(),
        assignments,
    })
}

fn parse_fail(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "fail <list|create|update|delete> [transient|notfound]";
    let mut words = rest.split_whitespace();
    let op = words
        .next()
        .ok_or(CommandError::Usage(USAGE))?
        .parse::<StoreOp>()
        .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    let kind = match words.next() {
        None | Some("transient") => FailureKind::Transient,
        Some("notfound") => FailureKind::NotFound,
        Some(_) => return Err(CommandError::Usage(USAGE)),
    };
    if words.next().is_some() {
        return Err(CommandError::Usage(USAGE));
    }
    Ok(Command::Fail { op, kind })
}
