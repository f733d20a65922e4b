//! Timer record and partial update structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Default configured duration for a freshly created timer, in seconds
pub const DEFAULT_DURATION_SECS: u64 = 600;

/// State of a single countdown timer, as broadcast to every client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    /// Display label
    pub name: String,
    /// Current task label
    pub task: String,
    /// Label of the next task, purely informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    /// Configured duration in whole seconds
    pub total_duration: u64,
    /// Seconds left on the countdown
    pub remaining: u64,
    /// Whether the countdown is advancing
    pub is_running: bool,
}

/// Derived lifecycle phase of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Completed,
}

impl TimerPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "stopped",
            Self::Running => "running",
            Self::Completed => "done",
        }
    }
}

impl TimerRecord {
    /// Create a stopped timer with the given labels and duration
    pub fn new(name: impl Into<String>, task: impl Into<String>, total_duration: u64) -> Self {
        Self {
            name: name.into(),
            task: task.into(),
            queue: None,
            total_duration,
            remaining: total_duration,
            is_running: false,
        }
    }

    /// Create the placeholder record for the timer at `index` (zero based)
    pub fn placeholder(index: usize) -> Self {
        let letter = char::from(b'A' + (index % 26) as u8);
        Self::new(
            format!("Timer {}", index + 1),
            format!("Task {}", letter),
            DEFAULT_DURATION_SECS,
        )
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.remaining == 0 {
            TimerPhase::Completed
        } else {
            TimerPhase::Idle
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns true if the record changed. A running record with nothing left
    /// is stopped, so `is_running` implies `remaining > 0` afterwards.
    pub fn advance(&mut self) -> bool {
        if !self.is_running {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.is_running = false;
        }
        true
    }

    /// Stop a depleted timer that was left running. Returns true if it was stopped.
    pub fn settle(&mut self) -> bool {
        if self.is_running && self.remaining == 0 {
            self.is_running = false;
            return true;
        }
        false
    }
}

/// A partial timer update; absent fields leave the existing value untouched.
///
/// Deserialization never fails: values of the wrong type are coerced where
/// that is unambiguous and dropped otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct TimerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
}

impl TimerPatch {
    /// Patch that starts the countdown
    pub fn start() -> Self {
        Self {
            is_running: Some(true),
            ..Self::default()
        }
    }

    /// Patch that pauses the countdown
    pub fn pause() -> Self {
        Self {
            is_running: Some(false),
            ..Self::default()
        }
    }

    /// Patch that resets the timer to a new stopped duration
    pub fn set(total_duration: u64) -> Self {
        Self {
            total_duration: Some(total_duration),
            remaining: Some(total_duration),
            is_running: Some(false),
            ..Self::default()
        }
    }

    /// Patch that replaces the user-editable labels
    pub fn metadata(name: String, task: String, queue: Option<String>) -> Self {
        Self {
            name: Some(name),
            task: Some(task),
            queue,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the supplied fields of `record`
    pub fn apply_to(&self, record: &mut TimerRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(task) = &self.task {
            record.task = task.clone();
        }
        if let Some(queue) = &self.queue {
            record.queue = Some(queue.clone());
        }
        if let Some(total_duration) = self.total_duration {
            record.total_duration = total_duration;
        }
        if let Some(remaining) = self.remaining {
            record.remaining = remaining;
        }
        if let Some(is_running) = self.is_running {
            record.is_running = is_running;
        }
    }

    /// Build a patch from arbitrary JSON, coercing or dropping each field
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            warn!("Timer data is not an object, ignoring it");
            return Self::default();
        };

        Self {
            name: coerce_field(fields, "name", coerce_text),
            task: coerce_field(fields, "task", coerce_text),
            queue: coerce_field(fields, "queue", coerce_text),
            total_duration: coerce_field(fields, "totalDuration", coerce_seconds),
            remaining: coerce_field(fields, "remaining", coerce_seconds),
            is_running: coerce_field(fields, "isRunning", coerce_flag),
        }
    }
}

impl From<Value> for TimerPatch {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

fn coerce_field<T>(
    fields: &Map<String, Value>,
    key: &str,
    coerce: fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key)?;
    let coerced = coerce(value);
    if coerced.is_none() {
        warn!(field = key, value = %value, "Dropping malformed timer field");
    }
    coerced
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_u64() {
                Some(secs)
            } else if n.as_i64().is_some() {
                // only negative integers fail as_u64
                Some(0)
            } else {
                n.as_f64().and_then(seconds_from_float)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(secs) => Some(secs.max(0) as u64),
                Err(_) => s.parse::<f64>().ok().and_then(seconds_from_float),
            }
        }
        _ => None,
    }
}

fn seconds_from_float(secs: f64) -> Option<u64> {
    if !secs.is_finite() {
        return None;
    }
    // `as` saturates at the u64 bounds
    Some(secs.floor().max(0.0) as u64)
}

fn coerce_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
