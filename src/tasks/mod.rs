//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod tick_scheduler;

// Re-export main functions
pub use tick_scheduler::{tick_scheduler_task, TICK_PERIOD};
