//! Observability counters for the grouping gate and resolver.
//!
//! The tagged decision counter mirrors what downstream dashboards consume:
//! every decision is attributed with `{call_made, blocker}` where the
//! blocker tag vocabulary is a compatibility contract (see
//! [`Blocker::as_str`]).

use crate::domain::decision::Blocker;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tag pair attributed to each gate decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionTags {
    /// Whether the similarity call was (about to be) made.
    pub call_made: bool,
    /// Blocker tag, `"none"` when nothing blocked.
    pub blocker: String,
}

/// Metrics tracking gate and resolver behavior.
///
/// Cheap to clone; all clones share the same counters. Scalar counters use
/// atomics, the tagged decision counter uses a concurrent map.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    decisions: DashMap<DecisionTags, u64, RandomState>,
    global_ratelimit_hits: AtomicU64,
    project_ratelimit_hits: AtomicU64,
    broken_breaker_hits: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                decisions: DashMap::with_hasher(RandomState::new()),
                global_ratelimit_hits: AtomicU64::new(0),
                project_ratelimit_hits: AtomicU64::new(0),
                broken_breaker_hits: AtomicU64::new(0),
            }),
        }
    }

    /// Record a gate/resolver decision under its tag pair.
    pub(crate) fn record_decision(&self, call_made: bool, blocker: &Blocker) {
        let tags = DecisionTags {
            call_made,
            blocker: blocker.as_str().to_owned(),
        };
        *self.inner.decisions.entry(tags).or_insert(0) += 1;
    }

    /// Record a global rate-limit hit.
    pub(crate) fn record_global_ratelimit_hit(&self) {
        self.inner.global_ratelimit_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a per-project rate-limit hit.
    pub(crate) fn record_project_ratelimit_hit(&self) {
        self.inner
            .project_ratelimit_hits
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record an encounter with a broken circuit breaker.
    pub(crate) fn record_broken_breaker(&self) {
        self.inner.broken_breaker_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count of decisions recorded under the given tag pair.
    pub fn decision_count(&self, call_made: bool, blocker: &str) -> u64 {
        let tags = DecisionTags {
            call_made,
            blocker: blocker.to_owned(),
        };
        self.inner.decisions.get(&tags).map(|c| *c).unwrap_or(0)
    }

    /// Total decisions recorded across all tags.
    pub fn total_decisions(&self) -> u64 {
        self.inner.decisions.iter().map(|entry| *entry.value()).sum()
    }

    /// Number of global rate-limit hits.
    pub fn global_ratelimit_hits(&self) -> u64 {
        self.inner.global_ratelimit_hits.load(Ordering::Relaxed)
    }

    /// Number of per-project rate-limit hits.
    pub fn project_ratelimit_hits(&self) -> u64 {
        self.inner.project_ratelimit_hits.load(Ordering::Relaxed)
    }

    /// Number of broken-breaker encounters.
    pub fn broken_breaker_hits(&self) -> u64 {
        self.inner.broken_breaker_hits.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut decisions: Vec<(DecisionTags, u64)> = self
            .inner
            .decisions
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        decisions.sort();

        MetricsSnapshot {
            decisions,
            global_ratelimit_hits: self.global_ratelimit_hits(),
            project_ratelimit_hits: self.project_ratelimit_hits(),
            broken_breaker_hits: self.broken_breaker_hits(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.decisions.clear();
        self.inner.global_ratelimit_hits.store(0, Ordering::Relaxed);
        self.inner.project_ratelimit_hits.store(0, Ordering::Relaxed);
        self.inner.broken_breaker_hits.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of all counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Decision counts, sorted by tag pair.
    pub decisions: Vec<(DecisionTags, u64)>,
    /// Number of global rate-limit hits.
    pub global_ratelimit_hits: u64,
    /// Number of per-project rate-limit hits.
    pub project_ratelimit_hits: u64,
    /// Number of broken-breaker encounters.
    pub broken_breaker_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_counts_by_tags() {
        let metrics = Metrics::new();

        metrics.record_decision(false, &Blocker::HybridFingerprint);
        metrics.record_decision(false, &Blocker::HybridFingerprint);
        metrics.record_decision(true, &Blocker::None);

        assert_eq!(metrics.decision_count(false, "hybrid-fingerprint"), 2);
        assert_eq!(metrics.decision_count(true, "none"), 1);
        assert_eq!(metrics.decision_count(false, "circuit-breaker"), 0);
        assert_eq!(metrics.total_decisions(), 3);
    }

    #[test]
    fn test_variant_type_tags() {
        let metrics = Metrics::new();
        metrics.record_decision(
            false,
            &Blocker::CustomizedFingerprint("built-in-fingerprint".to_owned()),
        );
        assert_eq!(metrics.decision_count(false, "built-in-fingerprint"), 1);
    }

    #[test]
    fn test_scalar_counters() {
        let metrics = Metrics::new();
        metrics.record_global_ratelimit_hit();
        metrics.record_global_ratelimit_hit();
        metrics.record_project_ratelimit_hit();
        metrics.record_broken_breaker();

        assert_eq!(metrics.global_ratelimit_hits(), 2);
        assert_eq!(metrics.project_ratelimit_hits(), 1);
        assert_eq!(metrics.broken_breaker_hits(), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        clone.record_decision(true, &Blocker::None);
        assert_eq!(metrics.decision_count(true, "none"), 1);
    }

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = Metrics::new();
        metrics.record_decision(false, &Blocker::GlobalRateLimit);
        metrics.record_global_ratelimit_hit();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.decisions.len(), 1);
        assert_eq!(snapshot.global_ratelimit_hits, 1);

        metrics.reset();
        assert_eq!(metrics.total_decisions(), 0);
        assert_eq!(metrics.global_ratelimit_hits(), 0);
    }
}
