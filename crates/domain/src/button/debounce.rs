//! Software debounce for a single button.
//!
//! The machine is fed logical levels (polarity already applied) together with
//! the instant they were sampled. A level must stay stable for the whole
//! debounce interval before it is committed; a glitch that reverts earlier is
//! swallowed without an event.

use std::time::{Duration, Instant};

use crate::event::ButtonEventKind;

/// Debounce state of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Released,
    PendingPress { since: Instant },
    Pressed,
    PendingRelease { since: Instant },
}

/// Per-button debounce state machine.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    state: DebounceState,
    last_transition: Option<Instant>,
}

impl Debouncer {
    /// Start in the released state.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: DebounceState::Released,
            last_transition: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Committed (debounced) level.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        matches!(
            self.state,
            DebounceState::Pressed | DebounceState::PendingRelease { .. }
        )
    }

    /// When the raw level last changed, if it ever did.
    #[must_use]
    pub fn last_transition(&self) -> Option<Instant> {
        self.last_transition
    }

    /// Feed one sample. Returns the event to emit when a level is committed.
    pub fn update(&mut self, active: bool, now: Instant) -> Option<ButtonEventKind> {
        use DebounceState::{Pressed, PendingPress, PendingRelease, Released};

        let next = match (self.state, active) {
            (Released, true) => PendingPress { since: now },
            (PendingPress { .. }, false) => Released,
            (Pressed, false) => PendingRelease { since: now },
            (PendingRelease { .. }, true) => Pressed,
            (unchanged, _) => unchanged,
        };
        if next != self.state {
            self.last_transition = Some(now);
            self.state = next;
        }

        match self.state {
            PendingPress { since } if now.saturating_duration_since(since) >= self.interval => {
                self.state = Pressed;
                Some(ButtonEventKind::Press)
            }
            PendingRelease { since } if now.saturating_duration_since(since) >= self.interval => {
                self.state = Released;
                Some(ButtonEventKind::Release)
            }
            _ => None,
        }
    }
}
