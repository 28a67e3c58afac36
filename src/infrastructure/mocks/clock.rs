//! Controllable clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Clock whose time only moves when a test tells it to.
///
/// The gate's time-dependent behavior is all deadline arithmetic: limiter
/// windows roll over, breaker failures age out of their evaluation window,
/// and a broken breaker goes half-open after its recovery duration. Driving
/// those transitions with a controllable clock keeps the assertions exact
/// instead of sleep-based.
///
/// # Examples
///
/// ```
/// use similarity_gate::infrastructure::mocks::MockClock;
/// use similarity_gate::application::ports::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
/// assert_eq!(clock.now(), start);
///
/// // Jump past a rate-limit window or a breaker recovery deadline
/// clock.advance(Duration::from_secs(30));
/// assert_eq!(clock.now(), start + Duration::from_secs(30));
///
/// // Or pin time to a specific instant
/// clock.set(start + Duration::from_secs(100));
/// assert_eq!(clock.now(), start + Duration::from_secs(100));
/// ```
///
/// Clones share the same underlying time value, so one handle can be given
/// to the store or breaker under test while the test keeps another to
/// advance it, from any thread.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: std::time::Duration) {
        *self.lock() += duration;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.lock() = instant;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.current_time
            .lock()
            .expect("mock clock mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.lock()
    }
}
