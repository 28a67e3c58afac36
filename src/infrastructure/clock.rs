//! Time source for the limiter windows and breaker recovery timers.
//!
//! Everything time-dependent in this crate (rate-limit window expiry,
//! circuit breaker failure aging and recovery) reads the clock through the
//! [`Clock`] port rather than calling `Instant::now()` directly, so tests
//! can drive windows and recovery deadlines deterministically. Production
//! code uses [`SystemClock`]; tests use `MockClock` from
//! `crate::infrastructure::mocks` (available with the `test-helpers`
//! feature or in test builds).

use crate::application::ports::Clock;
use std::time::Instant;

/// The real, monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
