//! Error types for the sync engine

use thiserror::Error;

/// Errors raised while handling client traffic. None of them are fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown timer id: {0}")]
    UnknownTimer(String),

    #[error("malformed client message: {0}")]
    MalformedMessage(#[from] serde_json::Error),
}
