//! Circuit breaker guarding calls to the similarity service.
//!
//! Tracks a rolling failure history under a stable key and refuses requests
//! once failure volume within the evaluation window crosses the configured
//! threshold. Unlike a fail-open log throttle, a broken breaker here means
//! the external call is skipped entirely: similarity matching is best-effort
//! and a failing service must not slow ingestion down.
//!
//! The gate only reads breaker state; the resolver records the outcome of
//! each actual call. Thresholds arrive with every call because they are
//! dynamically reloadable options, not construction-time constants.

use crate::application::ports::Clock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open due to failures, requests are refused
    Open,
    /// Circuit is testing whether the service has recovered
    HalfOpen,
}

/// Thresholds for circuit breaker behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Failure volume within the window that breaks the circuit
    pub error_limit: u32,
    /// Evaluation window for counting failures
    pub error_limit_window: Duration,
    /// How long a broken circuit stays broken before a probe is allowed
    pub recovery_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            error_limit: 5,
            error_limit_window: Duration::from_secs(60),
            recovery_duration: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    /// Failure timestamps within (roughly) the evaluation window.
    failures: VecDeque<Instant>,
    /// When the circuit last opened.
    opened_at: Option<Instant>,
}

/// Failure-aware guard for the similarity service, shared process-wide
/// behind an `Arc` under a stable key.
#[derive(Debug)]
pub struct CircuitBreaker {
    key: String,
    clock: Arc<dyn Clock>,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a breaker identified by `key`.
    pub fn new(key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: key.into(),
            clock,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: VecDeque::new(),
                opened_at: None,
            }),
        }
    }

    /// The stable identifier this breaker's state is keyed by.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the current circuit state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Check whether a request should be allowed.
    ///
    /// An open circuit transitions to half-open once `recovery_duration`
    /// has passed, allowing a single probe through.
    pub fn should_allow_request(&self, config: &CircuitBreakerConfig) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();

        match state.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_at = state.opened_at.unwrap_or(now);
                if now.saturating_duration_since(opened_at) >= config.recovery_duration {
                    state.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    /// Record a failed call to the service.
    pub fn record_failure(&self, config: &CircuitBreakerConfig) {
        let now = self.clock.now();
        let mut state = self.lock();

        state.failures.push_back(now);
        Self::expire_old_failures(&mut state.failures, now, config.error_limit_window);

        match state.state {
            CircuitState::HalfOpen => {
                // The probe failed, break the circuit again
                state.state = CircuitState::Open;
                state.opened_at = Some(now);
            }
            CircuitState::Closed => {
                if state.failures.len() >= config.error_limit as usize {
                    state.state = CircuitState::Open;
                    state.opened_at = Some(now);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Record a successful call to the service.
    ///
    /// A success while half-open closes the circuit and clears the failure
    /// history. Successes while closed leave the history alone; decay is
    /// handled by window expiry, not by interleaved successes.
    pub fn record_success(&self) {
        let mut state = self.lock();

        if state.state == CircuitState::HalfOpen {
            state.state = CircuitState::Closed;
            state.failures.clear();
            state.opened_at = None;
        }
    }

    /// Number of failures currently inside the evaluation window.
    pub fn failure_count(&self, config: &CircuitBreakerConfig) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        Self::expire_old_failures(&mut state.failures, now, config.error_limit_window);
        state.failures.len()
    }

    /// Reset the breaker to the closed state.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.state = CircuitState::Closed;
        state.failures.clear();
        state.opened_at = None;
    }

    fn expire_old_failures(failures: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&oldest) = failures.front() {
            if now.saturating_duration_since(oldest) > window {
                failures.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state
            .lock()
            .expect("circuit breaker mutex poisoned - a thread panicked while holding the lock")
    }
}

/// Shareable circuit breaker reference.
pub type SharedCircuitBreaker = Arc<CircuitBreaker>;
