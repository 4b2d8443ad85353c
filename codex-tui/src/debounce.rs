//! Quiet-window debouncing for editor commits

use std::time::{Duration, Instant};

/// Fires once a burst of events has been followed by a quiet window
#[derive(Debug, Default, Clone)]
pub struct Debouncer {
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event now
    pub fn touch(&mut self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&mut self, at: Instant) {
        self.last_event = Some(at);
    }

    /// Returns true once `window` has elapsed since the last event, then resets
    pub fn check_ready(&mut self, now: Instant, window: Duration) -> bool {
        match self.last_event {
            Some(last) if now.saturating_duration_since(last) >= window => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    /// Check if there are pending events (not debounced yet)
    pub fn has_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Drop any pending event
    pub fn cancel(&mut self) {
        self.last_event = None;
    }
}
