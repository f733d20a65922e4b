//! Wire protocol shared by the server and its clients
//!
//! Every WebSocket text frame carries one JSON envelope of the form
//! `{"event": <name>, "data": <payload>}`.

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::{
    error::SyncError,
    state::{Snapshot, TimerPatch},
};

/// Messages pushed from the server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full state of every timer, sent on connect and after every mutation
    StateUpdate(Arc<Snapshot>),
}

/// Messages sent from clients to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    UpdateTimer(TimerCommand),
}

/// Partial update for one timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerCommand {
    pub timer_id: String,
    #[serde(default)]
    pub timer_data: TimerPatch,
}

impl TimerCommand {
    pub fn new(timer_id: impl Into<String>, timer_data: TimerPatch) -> Self {
        Self {
            timer_id: timer_id.into(),
            timer_data,
        }
    }
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<TimerCommand> for ClientMessage {
    fn from(command: TimerCommand) -> Self {
        Self::UpdateTimer(command)
    }
}
