//! # similarity-gate
//!
//! Decision gate and orchestration for similarity-based error grouping.
//!
//! When an error event fails to join an existing issue group by exact hash,
//! an embedding-backed similarity service can be asked for its nearest
//! neighbors. That call is expensive and fragile, so it sits behind a gate:
//! feature flags, fingerprint checks, content eligibility, an operator
//! killswitch, a circuit breaker and two rate-limit scopes all get a veto
//! before a single request leaves the process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use similarity_gate::{
//!     Event, Group, GroupId, GroupStore, PrimaryHashes, ProjectId,
//!     SimilarIssueCandidate, SimilarIssuesRequest, SimilarityResolver,
//!     SimilarityTransport, TransportError,
//! };
//! use similarity_gate::infrastructure::options::StaticOptions;
//! use std::sync::Arc;
//!
//! // Adapters for your service's option store, group storage and RPC layer.
//! #[derive(Debug)]
//! struct Groups;
//! impl GroupStore for Groups {
//!     fn find_by_id(&self, _id: GroupId) -> Option<Group> {
//!         None
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Transport;
//! impl SimilarityTransport for Transport {
//!     fn send(
//!         &self,
//!         _request: &SimilarIssuesRequest,
//!     ) -> Result<Vec<SimilarIssueCandidate>, TransportError> {
//!         Ok(vec![])
//!     }
//! }
//!
//! let resolver = SimilarityResolver::builder()
//!     .with_options(Arc::new(StaticOptions::new()))
//!     .with_transport(Arc::new(Transport))
//!     .with_group_store(Arc::new(Groups))
//!     .build()
//!     .unwrap();
//!
//! let mut event = Event::new("ev-1", ProjectId(11), "NullPointerException in checkout");
//! let hashes = PrimaryHashes::new(vec!["d41d8cd9".to_owned()]);
//!
//! match resolver.resolve(&mut event, &hashes) {
//!     Ok(Some(group)) => println!("grouped into {}", group.id),
//!     Ok(None) => println!("no similar group, create a new one"),
//!     Err(err) => eprintln!("configuration problem: {err}"),
//! }
//! ```
//!
//! ## The decision pipeline
//!
//! [`GroupingGate::decide`](application::gate::GroupingGate::decide) runs
//! its checks in a fixed order and stops at the first veto:
//!
//! 1. Feature flag (or completed backfill) for the project
//! 2. Fingerprint: hybrid or customized fingerprints never use similarity
//! 3. Content eligibility
//! 4. Operator killswitch
//! 5. Circuit breaker health
//! 6. Global rate limit, then per-project rate limit
//!
//! The rate limits come last on purpose: checking a scope increments its
//! counter, so attempts that another check was going to reject must never
//! reach it. Every blocked decision carries a stable blocker tag (see
//! [`Blocker`]) that flows into metrics.
//!
//! ## Degradation
//!
//! Similarity matching is best-effort. A failing or slow service trips the
//! circuit breaker; transport failures (and even panics inside the call
//! path) degrade to "no match" instead of surfacing to ingestion. Only
//! configuration lookup failures propagate as errors.
//!
//! ## Observability
//!
//! Every decision lands in a tagged counter, with dedicated counters for
//! rate-limit and breaker hits:
//!
//! ```rust,no_run
//! # use similarity_gate::SimilarityResolver;
//! # fn demo(resolver: &SimilarityResolver) {
//! let metrics = resolver.metrics();
//! println!("calls made: {}", metrics.decision_count(true, "none"));
//! println!("shed globally: {}", metrics.global_ratelimit_hits());
//! println!("breaker skips: {}", metrics.broken_breaker_hits());
//! # }
//! ```
//!
//! ## Features
//!
//! - `http-transport`: blocking HTTP adapter for the similarity service
//! - `redis-limiter`: Redis-backed counters so rate limits span instances
//! - `test-helpers`: the mocks under `infrastructure::mocks`, for use in
//!   downstream integration tests

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    candidate::{SimilarIssueCandidate, SimilarityMetadata, SIMILARITY_MODEL_VERSION},
    decision::{Blocker, GroupingDecision},
    event::{Event, Group, GroupId, ProjectId},
    fingerprint::{classify_fingerprint, FingerprintClassification, DEFAULT_FINGERPRINT_TOKEN},
    hashes::{GroupingVariant, PrimaryHashes},
};

pub use application::{
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, SharedCircuitBreaker},
    client::{SimilarIssuesRequest, SimilarityClient},
    gate::GroupingGate,
    metrics::{Metrics, MetricsSnapshot},
    ports::{
        Clock, ConfigError, ContentPolicy, CounterStore, GroupStore, Killswitch, OptionsProvider,
        SimilarityTransport, TransportError,
    },
    rate_limit::{RateLimitConfig, RateLimiter},
    resolver::{BuildError, SimilarityResolver, SimilarityResolverBuilder},
};

pub use infrastructure::{
    clock::SystemClock,
    options::{DefaultContentPolicy, StaticKillswitch, StaticOptions},
    storage::InMemoryCounterStore,
};

#[cfg(feature = "http-transport")]
pub use infrastructure::http::HttpSimilarityTransport;

#[cfg(feature = "redis-limiter")]
pub use infrastructure::redis_counters::{RedisCounterConfig, RedisCounterStore};
