//! The grouping gate: decides whether a similarity call should be made.

use crate::application::circuit_breaker::SharedCircuitBreaker;
use crate::application::metrics::Metrics;
use crate::application::ports::{ConfigError, ContentPolicy, Killswitch, OptionsProvider};
use crate::application::rate_limit::{
    project_rate_limit_key, RateLimiter, GLOBAL_RATE_LIMIT_KEY,
};
use crate::domain::decision::{Blocker, GroupingDecision};
use crate::domain::event::Event;
use crate::domain::fingerprint::{classify_fingerprint, FingerprintClassification};
use crate::domain::hashes::PrimaryHashes;
use std::sync::Arc;

/// Chains the gating checks, in fixed order, into a single allow/deny
/// decision with an attributable blocker tag.
#[derive(Debug, Clone)]
pub struct GroupingGate {
    options: Arc<dyn OptionsProvider>,
    killswitch: Arc<dyn Killswitch>,
    content_policy: Arc<dyn ContentPolicy>,
    limiter: RateLimiter,
    breaker: SharedCircuitBreaker,
    metrics: Metrics,
}

impl GroupingGate {
    /// Create a gate over the given collaborators.
    pub fn new(
        options: Arc<dyn OptionsProvider>,
        killswitch: Arc<dyn Killswitch>,
        content_policy: Arc<dyn ContentPolicy>,
        limiter: RateLimiter,
        breaker: SharedCircuitBreaker,
        metrics: Metrics,
    ) -> Self {
        Self {
            options,
            killswitch,
            content_policy,
            limiter,
            breaker,
            metrics,
        }
    }

    /// Use feature flags, event content, killswitches, service health and
    /// rate limits to decide whether a similarity call should be made.
    ///
    /// Checks short-circuit: the first one that blocks determines the
    /// decision's blocker tag and nothing after it runs.
    ///
    /// **Do not add any new checks after the rate limit checks.** Checking
    /// a rate-limit scope also increments its attempt counter, so it must
    /// only run once every other check has already passed; otherwise
    /// attempts that were going to be rejected anyway would be counted.
    pub fn decide(
        &self,
        event: &Event,
        primary_hashes: &PrimaryHashes,
    ) -> Result<GroupingDecision, ConfigError> {
        let project = event.project_id;

        if !self.options.similarity_grouping_enabled(project)
            && !self.options.backfill_completed(project)
        {
            return Ok(GroupingDecision::blocked(Blocker::FeatureDisabled));
        }

        match classify_fingerprint(&event.fingerprint, primary_hashes) {
            FingerprintClassification::Standard => {}
            FingerprintClassification::Hybrid => {
                let blocker = Blocker::HybridFingerprint;
                self.metrics.record_decision(false, &blocker);
                return Ok(GroupingDecision::blocked(blocker));
            }
            FingerprintClassification::Customized(variant_type) => {
                let blocker = Blocker::CustomizedFingerprint(variant_type);
                self.metrics.record_decision(false, &blocker);
                return Ok(GroupingDecision::blocked(blocker));
            }
        }

        if !self.content_policy.is_eligible(event) {
            return Ok(GroupingDecision::blocked(Blocker::ContentIneligible));
        }

        if self.killswitch.is_active(project, event) {
            tracing::warn!(
                event_id = %event.id,
                project_id = %project,
                "similarity grouping killswitch is active",
            );
            return Ok(GroupingDecision::blocked(Blocker::Killswitch));
        }

        let breaker_config = self.options.circuit_breaker_config()?;
        if !self.breaker.should_allow_request(&breaker_config) {
            tracing::warn!(
                event_id = %event.id,
                project_id = %project,
                error_limit = breaker_config.error_limit,
                error_limit_window_secs = breaker_config.error_limit_window.as_secs(),
                "skipping similarity request, circuit breaker is broken",
            );
            self.metrics.record_broken_breaker();
            self.metrics.record_decision(false, &Blocker::CircuitBreaker);
            return Ok(GroupingDecision::blocked(Blocker::CircuitBreaker));
        }

        // Rate limits stay last: checking a scope advances its counter, and
        // the global scope is consulted before the per-project scope so a
        // globally shed attempt never touches project counters.
        let global_config = self.options.global_rate_limit()?;
        if self.limiter.is_limited(GLOBAL_RATE_LIMIT_KEY, &global_config) {
            tracing::warn!(
                event_id = %event.id,
                project_id = %project,
                limit_per_sec = global_config.limit_per_sec(),
                "global rate limit for similarity requests hit",
            );
            self.metrics.record_global_ratelimit_hit();
            self.metrics.record_decision(false, &Blocker::GlobalRateLimit);
            return Ok(GroupingDecision::blocked(Blocker::GlobalRateLimit));
        }

        let project_config = self.options.project_rate_limit()?;
        if self
            .limiter
            .is_limited(&project_rate_limit_key(project), &project_config)
        {
            tracing::warn!(
                event_id = %event.id,
                project_id = %project,
                limit_per_sec = project_config.limit_per_sec(),
                "project rate limit for similarity requests hit",
            );
            self.metrics.record_project_ratelimit_hit();
            self.metrics.record_decision(false, &Blocker::ProjectRateLimit);
            return Ok(GroupingDecision::blocked(Blocker::ProjectRateLimit));
        }

        Ok(GroupingDecision::allowed())
    }

    /// The configuration provider.
    pub fn options(&self) -> &Arc<dyn OptionsProvider> {
        &self.options
    }

    /// The circuit breaker read by this gate.
    pub fn circuit_breaker(&self) -> &SharedCircuitBreaker {
        &self.breaker
    }

    /// The rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
