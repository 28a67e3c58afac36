//! End-to-end tests of the gate's check ordering and side effects.
//!
//! Built against the public API with the `test-helpers` mocks, the way an
//! embedding service would wire the gate.

use similarity_gate::infrastructure::mocks::{
    MockClock, MockContentPolicy, MockKillswitch, MockOptions,
};
use similarity_gate::{
    Blocker, CircuitBreaker, Event, GroupingGate, GroupingVariant, InMemoryCounterStore, Metrics,
    PrimaryHashes, ProjectId, RateLimitConfig, RateLimiter, DEFAULT_FINGERPRINT_TOKEN,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Harness {
    gate: GroupingGate,
    options: Arc<MockOptions>,
    killswitch: Arc<MockKillswitch>,
    content_policy: Arc<MockContentPolicy>,
    store: Arc<InMemoryCounterStore>,
    clock: Arc<MockClock>,
}

fn harness() -> Harness {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let options = Arc::new(MockOptions::new());
    let killswitch = Arc::new(MockKillswitch::new());
    let content_policy = Arc::new(MockContentPolicy::new());
    let store = Arc::new(InMemoryCounterStore::new(clock.clone()));
    let breaker = Arc::new(CircuitBreaker::new("similarity.request", clock.clone()));
    let gate = GroupingGate::new(
        options.clone(),
        killswitch.clone(),
        content_policy.clone(),
        RateLimiter::new(store.clone()),
        breaker,
        Metrics::new(),
    );
    Harness {
        gate,
        options,
        killswitch,
        content_policy,
        store,
        clock,
    }
}

fn event(project: u64) -> Event {
    Event::new(format!("ev-{project}"), ProjectId(project), "Dogs are great!")
        .with_fingerprint(vec![DEFAULT_FINGERPRINT_TOKEN.to_owned()])
}

fn hashes() -> PrimaryHashes {
    PrimaryHashes::new(vec!["aaa".to_owned()])
}

#[test]
fn everything_open_allows_the_call() {
    let h = harness();
    let decision = h.gate.decide(&event(11), &hashes()).unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.blocker, Blocker::None);
}

#[test]
fn checks_run_in_order_and_stop_at_the_first_veto() {
    let h = harness();

    // Stack every veto at once; only the earliest one should be reported.
    h.options.set_similarity_grouping_enabled(false);
    h.content_policy.set_eligible(false);
    h.killswitch.set_active(true);

    let decision = h.gate.decide(&event(11), &hashes()).unwrap();
    assert_eq!(decision.blocker, Blocker::FeatureDisabled);
    // Nothing past the first veto ran
    assert_eq!(h.content_policy.check_count(), 0);
    assert_eq!(h.killswitch.check_count(), 0);

    // Re-enable the feature; the next veto in line takes over.
    h.options.set_similarity_grouping_enabled(true);
    let decision = h.gate.decide(&event(11), &hashes()).unwrap();
    assert_eq!(decision.blocker, Blocker::ContentIneligible);
    assert_eq!(h.killswitch.check_count(), 0);

    h.content_policy.set_eligible(true);
    let decision = h.gate.decide(&event(11), &hashes()).unwrap();
    assert_eq!(decision.blocker, Blocker::Killswitch);
}

#[test]
fn fingerprint_vetoes_come_before_content_and_killswitch() {
    let h = harness();
    h.content_policy.set_eligible(false);
    h.killswitch.set_active(true);

    let hybrid = event(11).with_fingerprint(vec![
        DEFAULT_FINGERPRINT_TOKEN.to_owned(),
        "payment-flow".to_owned(),
    ]);

    let decision = h.gate.decide(&hybrid, &hashes()).unwrap();
    assert_eq!(decision.blocker, Blocker::HybridFingerprint);
    assert_eq!(h.content_policy.check_count(), 0);
    assert_eq!(h.killswitch.check_count(), 0);
}

#[test]
fn customized_fingerprint_reports_the_variant_type() {
    let h = harness();
    let custom = event(11).with_fingerprint(vec!["database-errors".to_owned()]);
    let hashes = hashes().with_variant(
        "custom-fingerprint",
        GroupingVariant::new("custom-fingerprint"),
    );

    let decision = h.gate.decide(&custom, &hashes).unwrap();
    assert_eq!(
        decision.blocker,
        Blocker::CustomizedFingerprint("custom-fingerprint".to_owned())
    );
    assert_eq!(
        h.gate.metrics().decision_count(false, "custom-fingerprint"),
        1
    );
}

#[test]
fn no_check_before_the_limits_advances_their_counters() {
    let h = harness();
    h.killswitch.set_active(true);

    for _ in 0..10 {
        h.gate.decide(&event(11), &hashes()).unwrap();
    }

    assert_eq!(h.store.peek("similarity:global-limit"), 0);
    assert_eq!(h.store.peek("similarity:project-11-limit"), 0);
}

#[test]
fn global_limit_is_consulted_before_project_limit() {
    let h = harness();
    h.options
        .set_global_rate_limit(RateLimitConfig::new(2, Duration::from_secs(60)));

    assert!(h.gate.decide(&event(11), &hashes()).unwrap().allowed);
    assert!(h.gate.decide(&event(11), &hashes()).unwrap().allowed);

    let decision = h.gate.decide(&event(11), &hashes()).unwrap();
    assert_eq!(decision.blocker, Blocker::GlobalRateLimit);

    // The globally shed attempt never touched the project counter
    assert_eq!(h.store.peek("similarity:project-11-limit"), 2);
    assert_eq!(h.gate.metrics().global_ratelimit_hits(), 1);
}

#[test]
fn project_limits_do_not_leak_across_projects() {
    let h = harness();
    h.options
        .set_project_rate_limit(RateLimitConfig::new(1, Duration::from_secs(60)));

    assert!(h.gate.decide(&event(11), &hashes()).unwrap().allowed);
    assert_eq!(
        h.gate.decide(&event(11), &hashes()).unwrap().blocker,
        Blocker::ProjectRateLimit
    );
    assert!(h.gate.decide(&event(22), &hashes()).unwrap().allowed);
}

#[test]
fn limits_reset_when_the_window_rolls_over() {
    let h = harness();
    h.options
        .set_project_rate_limit(RateLimitConfig::new(1, Duration::from_secs(1)));

    assert!(h.gate.decide(&event(11), &hashes()).unwrap().allowed);
    assert!(!h.gate.decide(&event(11), &hashes()).unwrap().allowed);

    h.clock.advance(Duration::from_millis(1001));
    assert!(h.gate.decide(&event(11), &hashes()).unwrap().allowed);
}

#[test]
fn backfilled_project_bypasses_the_feature_flag() {
    let h = harness();
    h.options.set_similarity_grouping_enabled(false);
    h.options.mark_backfilled(ProjectId(11));

    assert!(h.gate.decide(&event(11), &hashes()).unwrap().allowed);
    assert_eq!(
        h.gate.decide(&event(22), &hashes()).unwrap().blocker,
        Blocker::FeatureDisabled
    );
}

#[test]
fn decision_metrics_carry_stable_blocker_tags() {
    let h = harness();

    // Fingerprint veto
    let hybrid = event(11).with_fingerprint(vec![
        DEFAULT_FINGERPRINT_TOKEN.to_owned(),
        "extra".to_owned(),
    ]);
    h.gate.decide(&hybrid, &hashes()).unwrap();

    // Rate limit veto
    h.options
        .set_global_rate_limit(RateLimitConfig::new(0, Duration::from_secs(60)));
    h.gate.decide(&event(11), &hashes()).unwrap();

    let metrics = h.gate.metrics();
    assert_eq!(metrics.decision_count(false, "hybrid-fingerprint"), 1);
    assert_eq!(metrics.decision_count(false, "global-rate-limit"), 1);
    assert_eq!(metrics.total_decisions(), 2);
}
