//! Mock configuration, killswitch and content-policy doubles.

use crate::application::circuit_breaker::CircuitBreakerConfig;
use crate::application::ports::{ConfigError, ContentPolicy, Killswitch, OptionsProvider};
use crate::application::rate_limit::RateLimitConfig;
use crate::domain::event::{Event, ProjectId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Options provider whose answers can be changed mid-test.
///
/// Starts permissive: feature enabled, generous limits, default breaker
/// thresholds. [`fail_config_lookups`](Self::fail_config_lookups) makes
/// every `Result`-returning lookup fail, for exercising configuration
/// error paths.
#[derive(Debug)]
pub struct MockOptions {
    enabled: AtomicBool,
    backfilled: Mutex<HashSet<ProjectId>>,
    global_rate_limit: Mutex<RateLimitConfig>,
    project_rate_limit: Mutex<RateLimitConfig>,
    circuit_breaker: Mutex<CircuitBreakerConfig>,
    fail_lookups: AtomicBool,
}

impl MockOptions {
    /// Create a permissive provider.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            backfilled: Mutex::new(HashSet::new()),
            global_rate_limit: Mutex::new(RateLimitConfig::new(1_000, Duration::from_secs(1))),
            project_rate_limit: Mutex::new(RateLimitConfig::new(1_000, Duration::from_secs(1))),
            circuit_breaker: Mutex::new(CircuitBreakerConfig::default()),
            fail_lookups: AtomicBool::new(false),
        }
    }

    /// Turn the feature flag on or off for every project.
    pub fn set_similarity_grouping_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Record the project's backfill as completed.
    pub fn mark_backfilled(&self, project: ProjectId) {
        self.lock(&self.backfilled).insert(project);
    }

    /// Replace the global-scope rate limit.
    pub fn set_global_rate_limit(&self, config: RateLimitConfig) {
        *self.lock(&self.global_rate_limit) = config;
    }

    /// Replace the per-project-scope rate limit.
    pub fn set_project_rate_limit(&self, config: RateLimitConfig) {
        *self.lock(&self.project_rate_limit) = config;
    }

    /// Replace the circuit breaker thresholds.
    pub fn set_circuit_breaker_config(&self, config: CircuitBreakerConfig) {
        *self.lock(&self.circuit_breaker) = config;
    }

    /// Make every fallible lookup return a missing-option error.
    pub fn fail_config_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::Relaxed);
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex
            .lock()
            .expect("MockOptions mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Default for MockOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsProvider for MockOptions {
    fn similarity_grouping_enabled(&self, _project: ProjectId) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn backfill_completed(&self, project: ProjectId) -> bool {
        self.lock(&self.backfilled).contains(&project)
    }

    fn global_rate_limit(&self) -> Result<RateLimitConfig, ConfigError> {
        if self.fail_lookups.load(Ordering::Relaxed) {
            return Err(ConfigError::MissingOption("similarity.global-rate-limit"));
        }
        Ok(*self.lock(&self.global_rate_limit))
    }

    fn project_rate_limit(&self) -> Result<RateLimitConfig, ConfigError> {
        if self.fail_lookups.load(Ordering::Relaxed) {
            return Err(ConfigError::MissingOption("similarity.project-rate-limit"));
        }
        Ok(*self.lock(&self.project_rate_limit))
    }

    fn circuit_breaker_config(&self) -> Result<CircuitBreakerConfig, ConfigError> {
        if self.fail_lookups.load(Ordering::Relaxed) {
            return Err(ConfigError::MissingOption(
                "similarity.circuit-breaker-config",
            ));
        }
        Ok(*self.lock(&self.circuit_breaker))
    }
}

/// Killswitch double that counts how often it is consulted.
#[derive(Debug, Default)]
pub struct MockKillswitch {
    active: AtomicBool,
    checks: AtomicU64,
}

impl MockKillswitch {
    /// Create an inactive killswitch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the killswitch.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// How many times the switch has been consulted.
    pub fn check_count(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}

impl Killswitch for MockKillswitch {
    fn is_active(&self, _project: ProjectId, _event: &Event) -> bool {
        self.checks.fetch_add(1, Ordering::Relaxed);
        self.active.load(Ordering::Relaxed)
    }
}

/// Content policy double that counts how often it is consulted.
#[derive(Debug)]
pub struct MockContentPolicy {
    eligible: AtomicBool,
    checks: AtomicU64,
}

impl MockContentPolicy {
    /// Create a policy that accepts everything.
    pub fn new() -> Self {
        Self {
            eligible: AtomicBool::new(true),
            checks: AtomicU64::new(0),
        }
    }

    /// Set whether events are considered eligible.
    pub fn set_eligible(&self, eligible: bool) {
        self.eligible.store(eligible, Ordering::Relaxed);
    }

    /// How many times the policy has been consulted.
    pub fn check_count(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}

impl Default for MockContentPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentPolicy for MockContentPolicy {
    fn is_eligible(&self, _event: &Event) -> bool {
        self.checks.fetch_add(1, Ordering::Relaxed);
        self.eligible.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_options_toggles() {
        let options = MockOptions::new();
        assert!(options.similarity_grouping_enabled(ProjectId(1)));

        options.set_similarity_grouping_enabled(false);
        assert!(!options.similarity_grouping_enabled(ProjectId(1)));

        options.mark_backfilled(ProjectId(1));
        assert!(options.backfill_completed(ProjectId(1)));
        assert!(!options.backfill_completed(ProjectId(2)));
    }

    #[test]
    fn test_mock_options_failure_mode() {
        let options = MockOptions::new();
        options.fail_config_lookups(true);

        assert!(options.global_rate_limit().is_err());
        assert!(options.project_rate_limit().is_err());
        assert!(options.circuit_breaker_config().is_err());

        options.fail_config_lookups(false);
        assert!(options.global_rate_limit().is_ok());
    }

    #[test]
    fn test_killswitch_counts_checks() {
        let killswitch = MockKillswitch::new();
        let event = Event::new("ev", ProjectId(1), "title");

        assert!(!killswitch.is_active(ProjectId(1), &event));
        killswitch.set_active(true);
        assert!(killswitch.is_active(ProjectId(1), &event));
        assert_eq!(killswitch.check_count(), 2);
    }

    #[test]
    fn test_content_policy_counts_checks() {
        let policy = MockContentPolicy::new();
        let event = Event::new("ev", ProjectId(1), "title");

        assert!(policy.is_eligible(&event));
        policy.set_eligible(false);
        assert!(!policy.is_eligible(&event));
        assert_eq!(policy.check_count(), 2);
    }
}
