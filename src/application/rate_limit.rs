//! Dual-scope request throttling for the similarity service.
//!
//! The limiter is a counting-window throttle over a shared [`CounterStore`]:
//! checking a key advances its counter as a side effect. The gate relies on
//! that side effect being well-ordered, which is why the rate-limit check is
//! always the last gate check and why the global scope is consulted before
//! the per-project scope.

use crate::application::ports::CounterStore;
use crate::domain::event::ProjectId;
use std::sync::Arc;
use std::time::Duration;

/// Counter key for the global scope.
pub const GLOBAL_RATE_LIMIT_KEY: &str = "similarity:global-limit";

/// Counter key for a project's scope.
pub fn project_rate_limit_key(project: ProjectId) -> String {
    format!("similarity:project-{project}-limit")
}

/// Quota for one limiter scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of requests per window.
    pub limit: u64,
    /// Length of the counting window.
    pub window: Duration,
}

impl RateLimitConfig {
    /// Create a config.
    pub fn new(limit: u64, window: Duration) -> Self {
        Self { limit, window }
    }

    /// The configured rate expressed as requests per second, used for
    /// log and metric context when a limit is hit.
    pub fn limit_per_sec(&self) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs > 0.0 {
            self.limit as f64 / secs
        } else {
            self.limit as f64
        }
    }
}

/// Counting-window rate limiter over a shared counter store.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a limiter backed by the given store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Check whether `key` has exceeded its quota.
    ///
    /// This advances the key's counter: every check counts as an attempt,
    /// whether or not it ends up limited.
    pub fn is_limited(&self, key: &str, config: &RateLimitConfig) -> bool {
        self.store.increment(key, config.window) > config.limit
    }

    /// The underlying counter store.
    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }
}
