//! State management module
//!
//! This module contains the timer data model, the authoritative store and the
//! shared application state that serializes access to it.

pub mod app_state;
pub mod timer_record;
pub mod timer_store;

// Re-export main types
pub use app_state::AppState;
pub use timer_record::{TimerPatch, TimerPhase, TimerRecord, DEFAULT_DURATION_SECS};
pub use timer_store::{Snapshot, TimerStore, DEFAULT_TIMER_COUNT};
