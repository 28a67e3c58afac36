//! Static configuration adapters.
//!
//! Fixed-value implementations of the options, killswitch and content-policy
//! ports. Services with a dynamic configuration system implement the ports
//! against it directly; these adapters cover embedders that configure the
//! gate once at startup.

use crate::application::circuit_breaker::CircuitBreakerConfig;
use crate::application::ports::{ConfigError, ContentPolicy, Killswitch, OptionsProvider};
use crate::application::rate_limit::RateLimitConfig;
use crate::domain::event::{Event, ProjectId};
use std::time::Duration;

/// Options provider with values fixed at construction time.
///
/// Defaults: feature enabled for every project, no backfills recorded,
/// 20 requests/s globally, 5 requests/s per project, default breaker
/// thresholds.
#[derive(Debug, Clone)]
pub struct StaticOptions {
    enabled: bool,
    backfilled_projects: Vec<ProjectId>,
    global_rate_limit: RateLimitConfig,
    project_rate_limit: RateLimitConfig,
    circuit_breaker: CircuitBreakerConfig,
}

impl StaticOptions {
    /// Create a provider with the default values.
    pub fn new() -> Self {
        Self {
            enabled: true,
            backfilled_projects: Vec::new(),
            global_rate_limit: RateLimitConfig::new(20, Duration::from_secs(1)),
            project_rate_limit: RateLimitConfig::new(5, Duration::from_secs(1)),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Set whether the similarity feature flag is on.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Record projects whose similarity backfill has completed.
    pub fn with_backfilled_projects(mut self, projects: Vec<ProjectId>) -> Self {
        self.backfilled_projects = projects;
        self
    }

    /// Set the global-scope rate limit.
    pub fn with_global_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.global_rate_limit = config;
        self
    }

    /// Set the per-project-scope rate limit.
    pub fn with_project_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.project_rate_limit = config;
        self
    }

    /// Set the circuit breaker thresholds.
    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsProvider for StaticOptions {
    fn similarity_grouping_enabled(&self, _project: ProjectId) -> bool {
        self.enabled
    }

    fn backfill_completed(&self, project: ProjectId) -> bool {
        self.backfilled_projects.contains(&project)
    }

    fn global_rate_limit(&self) -> Result<RateLimitConfig, ConfigError> {
        Ok(self.global_rate_limit)
    }

    fn project_rate_limit(&self) -> Result<RateLimitConfig, ConfigError> {
        Ok(self.project_rate_limit)
    }

    fn circuit_breaker_config(&self) -> Result<CircuitBreakerConfig, ConfigError> {
        Ok(self.circuit_breaker)
    }
}

/// Killswitch with a fixed position.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticKillswitch {
    active: bool,
}

impl StaticKillswitch {
    /// Create an inactive killswitch.
    pub fn new() -> Self {
        Self { active: false }
    }

    /// Create an active killswitch, blocking the similarity path entirely.
    pub fn active() -> Self {
        Self { active: true }
    }
}

impl Killswitch for StaticKillswitch {
    fn is_active(&self, _project: ProjectId, _event: &Event) -> bool {
        self.active
    }
}

/// Baseline content policy: events with an empty title (after stripping
/// null bytes) carry nothing the similarity model can embed, so they are
/// ineligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContentPolicy;

impl DefaultContentPolicy {
    /// Create the policy.
    pub fn new() -> Self {
        Self
    }
}

impl ContentPolicy for DefaultContentPolicy {
    fn is_eligible(&self, event: &Event) -> bool {
        !event.sanitized_title().is_empty()
    }
}
