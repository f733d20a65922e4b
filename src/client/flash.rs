//! Threshold flash sequences
//!
//! When a timer first drops to or below a threshold, its display flashes a
//! fixed number of times and then stays in an alert state. Each threshold has
//! its own latch so a sequence runs at most once per countdown pass.

use std::time::Duration;
use tokio::time::Instant;

/// Remaining-time thresholds that trigger a flash sequence, in seconds
pub const DEFAULT_THRESHOLDS: [u64; 2] = [300, 240];

/// Number of flag toggles in one sequence (five on/off cycles)
pub const FLASH_TOGGLES: u8 = 10;

/// Time between two toggles
pub const FLASH_INTERVAL: Duration = Duration::from_millis(500);

/// Progress of one flash sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashSequence {
    /// Not triggered during this countdown pass
    #[default]
    Inactive,
    /// Toggling; `toggles` counts the toggles performed so far
    Flashing { toggles: u8, lit: bool },
    /// Finished flashing, showing the persistent alert
    Settled,
}

impl FlashSequence {
    /// Start the sequence with its first toggle. Returns false if it already ran.
    pub fn trigger(&mut self) -> bool {
        if *self != Self::Inactive {
            return false;
        }
        *self = Self::Flashing { toggles: 1, lit: true };
        true
    }

    /// Advance one interval. Returns true if the sequence changed.
    pub fn step(&mut self) -> bool {
        match *self {
            Self::Flashing { toggles, lit } if toggles < FLASH_TOGGLES => {
                *self = Self::Flashing {
                    toggles: toggles + 1,
                    lit: !lit,
                };
                true
            }
            Self::Flashing { .. } => {
                *self = Self::Settled;
                true
            }
            Self::Inactive | Self::Settled => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Inactive;
    }

    pub fn is_lit(&self) -> bool {
        matches!(self, Self::Flashing { lit: true, .. })
    }

    pub fn is_flashing(&self) -> bool {
        matches!(self, Self::Flashing { .. })
    }

    pub fn is_settled(&self) -> bool {
        *self == Self::Settled
    }
}

/// A threshold with its once-per-pass latch.
///
/// A triggered sequence keeps its own toggle schedule starting at the moment
/// it was triggered, so sequences of different thresholds never share a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdAlert {
    threshold: u64,
    sequence: FlashSequence,
    next_toggle: Option<Instant>,
}

impl ThresholdAlert {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            sequence: FlashSequence::Inactive,
            next_toggle: None,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn sequence(&self) -> FlashSequence {
        self.sequence
    }

    /// When the running sequence is due for its next toggle
    pub fn next_toggle(&self) -> Option<Instant> {
        self.next_toggle
    }

    /// Look at a new remaining value, triggering the sequence on first crossing
    pub fn observe(&mut self, remaining: u64, now: Instant) -> bool {
        if remaining <= self.threshold && self.sequence.trigger() {
            self.next_toggle = Some(now + FLASH_INTERVAL);
            return true;
        }
        false
    }

    /// Clear the latch if a timer was set to a duration above the threshold
    pub fn rearm(&mut self, total_duration: u64) -> bool {
        if total_duration > self.threshold && self.sequence != FlashSequence::Inactive {
            self.sequence.reset();
            self.next_toggle = None;
            return true;
        }
        false
    }

    /// Perform the next toggle if it is due at `now`
    pub fn step_due(&mut self, now: Instant) -> bool {
        match self.next_toggle {
            Some(due) if due <= now => {
                self.sequence.step();
                self.next_toggle = self
                    .sequence
                    .is_flashing()
                    .then(|| due + FLASH_INTERVAL);
                true
            }
            _ => false,
        }
    }

    /// Whether this alert should color a timer showing `remaining`
    pub fn applies_to(&self, remaining: u64) -> bool {
        remaining <= self.threshold
    }
}
