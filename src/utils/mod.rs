//! Utility functions module
//!
//! Shutdown signal handling and clock formatting shared by both binaries.

pub mod signals;
pub mod time;

// Re-export main functions
pub use signals::shutdown_signal;
pub use time::{format_clock, parse_clock_field};
