//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
    /// Number of connected sync clients
    pub clients: usize,
    /// Number of timers held by the server
    pub timers: usize,
    /// Timer touched by the most recent client command
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok(
        uptime: String,
        clients: usize,
        timers: usize,
        last_action: Option<String>,
        last_action_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
            clients,
            timers,
            last_action,
            last_action_time,
        }
    }
}
