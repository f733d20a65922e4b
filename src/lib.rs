//! Timer Sync - An authoritative countdown timer server with real-time state sync
//!
//! The server owns a fixed set of countdown timers, advances them once per
//! second and pushes a full snapshot to every connected WebSocket client after
//! each change. Clients send partial updates that are merged last-write-wins.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, WatchConfig};
pub use error::SyncError;
pub use state::{AppState, Snapshot, TimerPatch, TimerRecord, TimerStore};
pub use utils::signals::shutdown_signal;
