//! Client-side reconciliation module
//!
//! Everything a connected viewer needs: the local mirror of the server's
//! timers, the threshold flash state machine, user action parsing and the
//! reconnecting session loop.

pub mod actions;
pub mod flash;
pub mod reconciler;
pub mod session;

// Re-export main types
pub use actions::{ActionError, LabelField, Outcome, UserAction};
pub use flash::{FlashSequence, ThresholdAlert, DEFAULT_THRESHOLDS, FLASH_INTERVAL, FLASH_TOGGLES};
pub use reconciler::{LocalTimer, MetadataDraft, Reconciler, Visual};
pub use session::Session;
