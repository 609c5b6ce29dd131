//! Rate limiting for high-frequency host events
//!
//! Both helpers take the current instant from the caller so hosts can
//! drive them from their own clock and tests stay deterministic.

use std::time::{Duration, Instant};

/// Lets an event through at most once per interval (leading edge)
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// Returns `true` if the event should be handled now
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

/// Fires once, `delay` after the last event of a burst (trailing edge)
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record an event, pushing the deadline back
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns `true` once the deadline has passed, then disarms
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
