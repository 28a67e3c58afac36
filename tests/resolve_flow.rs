//! End-to-end tests of the resolve flow: gate, similarity call, metadata
//! write-back and group lookup.

use similarity_gate::infrastructure::mocks::{MockGroupStore, MockOptions, MockTransport};
use similarity_gate::{
    Event, Group, GroupId, OptionsProvider, PrimaryHashes, ProjectId, SimilarIssueCandidate,
    SimilarityResolver, TransportError, DEFAULT_FINGERPRINT_TOKEN, SIMILARITY_MODEL_VERSION,
};
use std::sync::Arc;

fn candidate(group_id: u64, stacktrace_distance: f64) -> SimilarIssueCandidate {
    SimilarIssueCandidate {
        parent_hash: format!("hash-{group_id}"),
        parent_group_id: GroupId(group_id),
        stacktrace_distance,
        message_distance: stacktrace_distance / 2.0,
        should_group: stacktrace_distance < 0.2,
    }
}

fn event() -> Event {
    Event::new("ev-1", ProjectId(11), "ValueError: cannot divide by zero")
        .with_fingerprint(vec![DEFAULT_FINGERPRINT_TOKEN.to_owned()])
        .with_exception_type("ValueError")
}

fn hashes() -> PrimaryHashes {
    PrimaryHashes::new(vec!["aaa".to_owned()])
}

fn build(
    transport: Arc<MockTransport>,
    groups: Arc<MockGroupStore>,
    options: Arc<MockOptions>,
) -> SimilarityResolver {
    SimilarityResolver::builder()
        .with_options(options)
        .with_transport(transport)
        .with_group_store(groups)
        .build()
        .unwrap()
}

#[test]
fn closest_candidate_wins() {
    let transport = Arc::new(MockTransport::returning(vec![
        candidate(5, 0.1),
        candidate(9, 0.4),
    ]));
    let groups = Arc::new(MockGroupStore::new());
    groups.insert(Group::new(GroupId(5)));
    groups.insert(Group::new(GroupId(9)));
    let resolver = build(transport, groups, Arc::new(MockOptions::new()));

    let mut event = event();
    let found = resolver.resolve(&mut event, &hashes()).unwrap();
    assert_eq!(found, Some(Group::new(GroupId(5))));
}

#[test]
fn metadata_records_every_candidate_and_the_model_version() {
    let transport = Arc::new(MockTransport::returning(vec![
        candidate(5, 0.1),
        candidate(9, 0.4),
    ]));
    let groups = Arc::new(MockGroupStore::new());
    groups.insert(Group::new(GroupId(5)));
    let resolver = build(transport, groups, Arc::new(MockOptions::new()));

    let mut event = event();
    resolver.resolve(&mut event, &hashes()).unwrap();

    let stored = event.metadata.get("similarity").unwrap();
    assert_eq!(stored["results"].as_array().unwrap().len(), 2);
    assert_eq!(stored["results"][0]["parent_group_id"], 5);
    assert_eq!(stored["results"][0]["should_group"], true);
    assert_eq!(stored["results"][1]["parent_group_id"], 9);
    assert_eq!(stored["results"][1]["should_group"], false);
    assert_eq!(
        stored["similarity_model_version"],
        SIMILARITY_MODEL_VERSION
    );
}

#[test]
fn empty_response_still_records_the_attempt() {
    let transport = Arc::new(MockTransport::returning(vec![]));
    let resolver = build(
        transport,
        Arc::new(MockGroupStore::new()),
        Arc::new(MockOptions::new()),
    );

    let mut event = event();
    let found = resolver.resolve(&mut event, &hashes()).unwrap();

    assert_eq!(found, None);
    let stored = event.metadata.get("similarity").unwrap();
    assert_eq!(stored["results"], serde_json::json!([]));
}

#[test]
fn blocked_gate_means_no_request_and_no_metadata() {
    let options = Arc::new(MockOptions::new());
    options.set_similarity_grouping_enabled(false);
    let transport = Arc::new(MockTransport::returning(vec![candidate(5, 0.1)]));
    let resolver = build(transport.clone(), Arc::new(MockGroupStore::new()), options);

    let mut event = event();
    let found = resolver.resolve(&mut event, &hashes()).unwrap();

    assert_eq!(found, None);
    assert_eq!(transport.call_count(), 0);
    assert!(event.metadata.is_empty());
}

#[test]
fn transport_failure_degrades_to_no_match() {
    let transport = Arc::new(MockTransport::failing(TransportError::new(
        "similarity rpc failed: timeout",
    )));
    let resolver = build(
        transport,
        Arc::new(MockGroupStore::new()),
        Arc::new(MockOptions::new()),
    );

    let mut event = event();
    let found = resolver.resolve(&mut event, &hashes()).unwrap();

    assert_eq!(found, None);
    assert!(event.metadata.is_empty());
}

#[test]
fn request_carries_the_event_shape_the_service_expects() {
    let transport = Arc::new(MockTransport::returning(vec![]));
    let resolver = build(
        transport.clone(),
        Arc::new(MockGroupStore::new()),
        Arc::new(MockOptions::new()),
    );

    let mut event = event();
    resolver.resolve(&mut event, &hashes()).unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(request.event_id, "ev-1");
    assert_eq!(request.hash, "aaa");
    assert_eq!(request.project_id, 11);
    assert_eq!(request.message, "ValueError: cannot divide by zero");
    assert_eq!(request.exception_type.as_deref(), Some("ValueError"));
    assert_eq!(request.k, 1);
    assert_eq!(request.referrer, "ingest");
}

#[test]
fn repeated_failures_trip_the_breaker_and_stop_outbound_calls() {
    let options = Arc::new(MockOptions::new());
    let transport = Arc::new(MockTransport::failing(TransportError::new(
        "similarity rpc failed: connection refused",
    )));
    let resolver = build(transport.clone(), Arc::new(MockGroupStore::new()), options.clone());

    let error_limit = options.circuit_breaker_config().unwrap().error_limit;
    for _ in 0..error_limit {
        resolver.resolve(&mut event(), &hashes()).unwrap();
    }
    assert_eq!(transport.call_count(), u64::from(error_limit));

    // Gate now refuses before the transport is reached
    resolver.resolve(&mut event(), &hashes()).unwrap();
    resolver.resolve(&mut event(), &hashes()).unwrap();
    assert_eq!(transport.call_count(), u64::from(error_limit));
    assert_eq!(resolver.metrics().broken_breaker_hits(), 2);
}

#[test]
fn service_recovery_closes_the_loop_again() {
    let options = Arc::new(MockOptions::new());
    let transport = Arc::new(MockTransport::returning(vec![candidate(5, 0.1)]));
    let groups = Arc::new(MockGroupStore::new());
    groups.insert(Group::new(GroupId(5)));

    // A couple of failures below the limit, then the service comes back
    transport.push_response(Err(TransportError::new("similarity rpc failed")));
    transport.push_response(Err(TransportError::new("similarity rpc failed")));

    let resolver = build(transport, groups, options);

    assert_eq!(resolver.resolve(&mut event(), &hashes()).unwrap(), None);
    assert_eq!(resolver.resolve(&mut event(), &hashes()).unwrap(), None);
    assert_eq!(
        resolver.resolve(&mut event(), &hashes()).unwrap(),
        Some(Group::new(GroupId(5)))
    );
}

#[test]
fn two_identical_events_resolve_identically() {
    let transport = Arc::new(MockTransport::returning(vec![candidate(5, 0.1)]));
    let groups = Arc::new(MockGroupStore::new());
    groups.insert(Group::new(GroupId(5)));
    let resolver = build(transport, groups, Arc::new(MockOptions::new()));

    let mut first = event();
    let mut second = event();

    assert_eq!(
        resolver.resolve(&mut first, &hashes()).unwrap(),
        resolver.resolve(&mut second, &hashes()).unwrap()
    );
    assert_eq!(first.metadata, second.metadata);
}

#[test]
fn deleted_parent_group_is_a_clean_miss() {
    let transport = Arc::new(MockTransport::returning(vec![candidate(5, 0.1)]));
    let groups = Arc::new(MockGroupStore::new());
    let resolver = build(transport, groups, Arc::new(MockOptions::new()));

    let mut event = event();
    assert_eq!(resolver.resolve(&mut event, &hashes()).unwrap(), None);
    // The candidate list is still recorded for later inspection
    assert!(event.metadata.contains_key("similarity"));
}

#[test]
fn made_calls_are_counted_under_the_none_tag() {
    let transport = Arc::new(MockTransport::returning(vec![]));
    let resolver = build(
        transport,
        Arc::new(MockGroupStore::new()),
        Arc::new(MockOptions::new()),
    );

    resolver.resolve(&mut event(), &hashes()).unwrap();
    resolver.resolve(&mut event(), &hashes()).unwrap();

    assert_eq!(resolver.metrics().decision_count(true, "none"), 2);
    assert_eq!(resolver.metrics().total_decisions(), 2);
}
