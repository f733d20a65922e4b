//! User actions typed into the terminal client

use std::str::FromStr;
use thiserror::Error;

use super::reconciler::Reconciler;
use crate::{protocol::TimerCommand, utils::parse_clock_field};

/// Errors while reading a user action line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Which label of the metadata draft to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Name,
    Task,
    Queue,
}

/// One user action against a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Start(String),
    Pause(String),
    Set {
        timer_id: String,
        minutes: u64,
        seconds: u64,
    },
    Edit(String),
    Label {
        timer_id: String,
        field: LabelField,
        value: String,
    },
    Save(String),
    Cancel(String),
    Quit,
}

/// Result of applying an action to the local mirror
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send this command to the server
    Send(TimerCommand),
    /// Local state changed, nothing to send
    Local,
    /// The action had no effect
    Ignored,
}

impl FromStr for UserAction {
    type Err = ActionError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let (timer_id, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let timer_id = timer_id.to_string();
        let arg = arg.trim();

        let needs_id = |usage: &'static str| -> Result<String, ActionError> {
            if timer_id.is_empty() {
                Err(ActionError::Usage(usage))
            } else {
                Ok(timer_id.clone())
            }
        };
        let label = |field: LabelField, usage: &'static str| -> Result<Self, ActionError> {
            Ok(Self::Label {
                timer_id: needs_id(usage)?,
                field,
                value: arg.to_string(),
            })
        };

        match verb.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start(needs_id("start <timer>")?)),
            "pause" => Ok(Self::Pause(needs_id("pause <timer>")?)),
            "set" => {
                let timer_id = needs_id("set <timer> <minutes> [seconds]")?;
                let mut fields = arg.split_whitespace();
                let minutes = fields
                    .next()
                    .map(parse_clock_field)
                    .ok_or(ActionError::Usage("set <timer> <minutes> [seconds]"))?;
                let seconds = fields.next().map(parse_clock_field).unwrap_or(0);
                Ok(Self::Set {
                    timer_id,
                    minutes,
                    seconds,
                })
            }
            "edit" => Ok(Self::Edit(needs_id("edit <timer>")?)),
            "name" => label(LabelField::Name, "name <timer> <text>"),
            "task" => label(LabelField::Task, "task <timer> <text>"),
            "queue" => label(LabelField::Queue, "queue <timer> <text>"),
            "save" => Ok(Self::Save(needs_id("save <timer>")?)),
            "cancel" => Ok(Self::Cancel(needs_id("cancel <timer>")?)),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(ActionError::UnknownAction(verb.to_string())),
        }
    }
}

impl UserAction {
    /// Apply the action to the mirror, returning what to send
    pub fn apply(self, reconciler: &mut Reconciler) -> Outcome {
        let command = match self {
            Self::Start(id) => reconciler.start(&id),
            Self::Pause(id) => reconciler.pause(&id),
            Self::Set {
                timer_id,
                minutes,
                seconds,
            } => reconciler.set(&timer_id, minutes, seconds),
            Self::Save(id) => reconciler.save_metadata(&id),
            Self::Edit(id) => return local(reconciler.open_editor(&id)),
            Self::Cancel(id) => return local(reconciler.cancel_editor(&id)),
            Self::Label {
                timer_id,
                field,
                value,
            } => {
                let Some(draft) = reconciler.draft_mut(&timer_id) else {
                    return Outcome::Ignored;
                };
                match field {
                    LabelField::Name => draft.name = value,
                    LabelField::Task => draft.task = value,
                    LabelField::Queue => draft.queue = Some(value),
                }
                return Outcome::Local;
            }
            Self::Quit => return Outcome::Ignored,
        };

        command.map_or(Outcome::Ignored, Outcome::Send)
    }
}

fn local(changed: bool) -> Outcome {
    if changed {
        Outcome::Local
    } else {
        Outcome::Ignored
    }
}
