//! The resolver: orchestrates gate, client and group lookup.
//!
//! Similarity matching is strictly best-effort once the gate has passed.
//! The resolver is the single point where external-call failures (and any
//! panic inside the post-gate orchestration) are converted to "no match";
//! only pre-call configuration errors surface to the caller.

use crate::application::circuit_breaker::SharedCircuitBreaker;
use crate::application::client::SimilarityClient;
use crate::application::gate::GroupingGate;
use crate::application::metrics::Metrics;
use crate::application::ports::{
    Clock, ConfigError, ContentPolicy, CounterStore, GroupStore, Killswitch, OptionsProvider,
    SimilarityTransport,
};
use crate::application::rate_limit::RateLimiter;
use crate::domain::candidate::SimilarityMetadata;
use crate::domain::decision::Blocker;
use crate::domain::event::{Event, Group};
use crate::domain::hashes::PrimaryHashes;
use std::panic;
use std::sync::Arc;

/// Default number of nearest neighbors requested per event.
pub const DEFAULT_NEIGHBOR_COUNT: usize = 1;

/// Stable key identifying the similarity service's circuit breaker.
pub const SIMILARITY_BREAKER_KEY: &str = "similarity.request";

/// Resolves an event to an existing issue group via similarity matching,
/// or to `None` when the gate blocks, the service finds nothing, or the
/// call fails.
#[derive(Debug, Clone)]
pub struct SimilarityResolver {
    gate: GroupingGate,
    client: SimilarityClient,
    groups: Arc<dyn GroupStore>,
    neighbor_count: usize,
}

impl SimilarityResolver {
    /// Start building a resolver.
    pub fn builder() -> SimilarityResolverBuilder {
        SimilarityResolverBuilder::default()
    }

    /// Create a resolver from already-wired parts.
    pub fn new(gate: GroupingGate, client: SimilarityClient, groups: Arc<dyn GroupStore>) -> Self {
        Self {
            gate,
            client,
            groups,
            neighbor_count: DEFAULT_NEIGHBOR_COUNT,
        }
    }

    /// Ask the similarity service for the event's nearest neighbor and map
    /// the answer onto an existing group.
    ///
    /// Exactly one terminal state per attempt:
    /// - gate blocked: no call made, no metadata written, `Ok(None)`;
    /// - call failed (or panicked): reported, breaker failure recorded,
    ///   no metadata written, `Ok(None)`;
    /// - call succeeded: candidates plus model version written into the
    ///   event's metadata, and the best candidate's group returned if the
    ///   group store still knows it.
    ///
    /// Only configuration lookup failures return `Err`.
    pub fn resolve(
        &self,
        event: &mut Event,
        primary_hashes: &PrimaryHashes,
    ) -> Result<Option<Group>, ConfigError> {
        let decision = self.gate.decide(event, primary_hashes)?;
        if !decision.allowed {
            return Ok(None);
        }

        let breaker_config = self.gate.options().circuit_breaker_config()?;
        let breaker = self.gate.circuit_breaker();
        self.gate.metrics().record_decision(true, &Blocker::None);

        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.client.fetch(event, primary_hashes, self.neighbor_count)
        }));

        let candidates = match outcome {
            Ok(Ok(candidates)) => {
                breaker.record_success();
                candidates
            }
            Ok(Err(err)) => {
                breaker.record_failure(&breaker_config);
                tracing::error!(
                    event_id = %event.id,
                    project_id = %event.project_id,
                    error = %err,
                    "similarity request failed, treating as no match",
                );
                return Ok(None);
            }
            Err(_) => {
                breaker.record_failure(&breaker_config);
                tracing::error!(
                    event_id = %event.id,
                    project_id = %event.project_id,
                    "similarity request panicked, treating as no match",
                );
                return Ok(None);
            }
        };

        let metadata = SimilarityMetadata::from_results(candidates);
        if let Err(err) = event.set_similarity_metadata(&metadata) {
            tracing::error!(
                event_id = %event.id,
                error = %err,
                "failed to serialize similarity results, treating as no match",
            );
            return Ok(None);
        }

        let parent_group = metadata
            .results
            .first()
            .and_then(|best| self.groups.find_by_id(best.parent_group_id));

        tracing::info!(
            event_id = %event.id,
            project_id = %event.project_id,
            results = metadata.results.len(),
            group_returned = parent_group.is_some(),
            "similarity lookup finished",
        );

        Ok(parent_group)
    }

    /// The gate used by this resolver.
    pub fn gate(&self) -> &GroupingGate {
        &self.gate
    }

    /// The metrics handle shared with the gate.
    pub fn metrics(&self) -> &Metrics {
        self.gate.metrics()
    }
}

/// Error returned when resolver construction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// No options provider was supplied.
    MissingOptionsProvider,
    /// No similarity transport was supplied.
    MissingTransport,
    /// No group store was supplied.
    MissingGroupStore,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::MissingOptionsProvider => {
                f.write_str("an options provider is required to build a resolver")
            }
            BuildError::MissingTransport => {
                f.write_str("a similarity transport is required to build a resolver")
            }
            BuildError::MissingGroupStore => {
                f.write_str("a group store is required to build a resolver")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder wiring a [`SimilarityResolver`] and its gate.
///
/// Options provider, transport and group store are required; everything
/// else has production defaults (system clock, in-process counter store,
/// inactive killswitch, permissive content policy).
#[derive(Debug, Default)]
pub struct SimilarityResolverBuilder {
    options: Option<Arc<dyn OptionsProvider>>,
    transport: Option<Arc<dyn SimilarityTransport>>,
    groups: Option<Arc<dyn GroupStore>>,
    killswitch: Option<Arc<dyn Killswitch>>,
    content_policy: Option<Arc<dyn ContentPolicy>>,
    counters: Option<Arc<dyn CounterStore>>,
    clock: Option<Arc<dyn Clock>>,
    breaker: Option<SharedCircuitBreaker>,
    metrics: Option<Metrics>,
    neighbor_count: usize,
}

impl SimilarityResolverBuilder {
    /// Set the configuration provider (required).
    pub fn with_options(mut self, options: Arc<dyn OptionsProvider>) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the similarity transport (required).
    pub fn with_transport(mut self, transport: Arc<dyn SimilarityTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the group store (required).
    pub fn with_group_store(mut self, groups: Arc<dyn GroupStore>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Set the operator killswitch.
    pub fn with_killswitch(mut self, killswitch: Arc<dyn Killswitch>) -> Self {
        self.killswitch = Some(killswitch);
        self
    }

    /// Set the content-eligibility policy.
    pub fn with_content_policy(mut self, content_policy: Arc<dyn ContentPolicy>) -> Self {
        self.content_policy = Some(content_policy);
        self
    }

    /// Set the counter store backing the rate limiter.
    pub fn with_counter_store(mut self, counters: Arc<dyn CounterStore>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing circuit breaker instead of creating one.
    pub fn with_circuit_breaker(mut self, breaker: SharedCircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Share an existing metrics handle instead of creating one.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Request `k` nearest neighbors per event instead of the default 1.
    pub fn with_neighbor_count(mut self, k: usize) -> Self {
        self.neighbor_count = k;
        self
    }

    /// Build the resolver.
    ///
    /// # Errors
    /// Returns a [`BuildError`] naming the first missing required part.
    pub fn build(self) -> Result<SimilarityResolver, BuildError> {
        let options = self.options.ok_or(BuildError::MissingOptionsProvider)?;
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        let groups = self.groups.ok_or(BuildError::MissingGroupStore)?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(crate::infrastructure::clock::SystemClock::new()));
        let counters = self.counters.unwrap_or_else(|| {
            Arc::new(crate::infrastructure::storage::InMemoryCounterStore::new(
                clock.clone(),
            ))
        });
        let killswitch = self
            .killswitch
            .unwrap_or_else(|| Arc::new(crate::infrastructure::options::StaticKillswitch::new()));
        let content_policy = self.content_policy.unwrap_or_else(|| {
            Arc::new(crate::infrastructure::options::DefaultContentPolicy::new())
        });
        let breaker = self.breaker.unwrap_or_else(|| {
            Arc::new(crate::application::circuit_breaker::CircuitBreaker::new(
                SIMILARITY_BREAKER_KEY,
                clock.clone(),
            ))
        });
        let metrics = self.metrics.unwrap_or_default();

        let gate = GroupingGate::new(
            options,
            killswitch,
            content_policy,
            RateLimiter::new(counters),
            breaker,
            metrics,
        );

        let neighbor_count = if self.neighbor_count == 0 {
            DEFAULT_NEIGHBOR_COUNT
        } else {
            self.neighbor_count
        };

        Ok(SimilarityResolver {
            gate,
            client: SimilarityClient::new(transport),
            groups,
            neighbor_count,
        })
    }
}
