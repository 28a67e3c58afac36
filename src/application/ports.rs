//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.
//! Modeling shared limiter/breaker state, configuration, and the external
//! similarity call as injected handles keeps every gate check deterministic
//! under test doubles.

use crate::application::circuit_breaker::CircuitBreakerConfig;
use crate::application::client::SimilarIssuesRequest;
use crate::application::rate_limit::RateLimitConfig;
use crate::domain::candidate::SimilarIssueCandidate;
use crate::domain::event::{Event, Group, GroupId, ProjectId};
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Port for obtaining current time.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for shared counting-window counters.
///
/// Counters back the rate limiter and are shared by every worker in a
/// process (or across processes, with the Redis adapter). Increments must
/// be atomic per key; no cross-key consistency is assumed.
pub trait CounterStore: Send + Sync + Debug {
    /// Atomically increment the counter for `key`'s current window and
    /// return the new count within that window.
    ///
    /// Backends that can fail (e.g. Redis) log a warning and return 0,
    /// failing open rather than blocking ingestion.
    fn increment(&self, key: &str, window: Duration) -> u64;
}

/// Error returned when limiter or breaker configuration cannot be resolved.
///
/// Unlike failures of the similarity call itself, configuration lookup
/// failures are operational incidents and propagate to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The named option is missing from the configuration source.
    MissingOption(&'static str),
    /// The named option is present but malformed.
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingOption(name) => {
                write!(f, "configuration option `{name}` is missing")
            }
            ConfigError::InvalidOption { name, reason } => {
                write!(f, "configuration option `{name}` is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Port for dynamically sourced feature flags and threshold configuration.
///
/// Values may be reloaded at any time by the hosting service, so the gate
/// re-reads them on every decision rather than caching them.
pub trait OptionsProvider: Send + Sync + Debug {
    /// Whether the project has the similarity-grouping feature flag on.
    fn similarity_grouping_enabled(&self, project: ProjectId) -> bool;

    /// Whether the project's one-time similarity backfill has completed.
    ///
    /// Backfilled projects get similarity grouping even before the feature
    /// flag reaches them.
    fn backfill_completed(&self, project: ProjectId) -> bool;

    /// The global-scope rate limit.
    fn global_rate_limit(&self) -> Result<RateLimitConfig, ConfigError>;

    /// The per-project-scope rate limit.
    fn project_rate_limit(&self) -> Result<RateLimitConfig, ConfigError>;

    /// Thresholds for the circuit breaker guarding the similarity service.
    fn circuit_breaker_config(&self) -> Result<CircuitBreakerConfig, ConfigError>;
}

/// Port for the operator killswitch.
///
/// An active killswitch forcibly disables the similarity path regardless of
/// feature flags.
pub trait Killswitch: Send + Sync + Debug {
    /// Whether the killswitch blocks this event.
    fn is_active(&self, project: ProjectId, event: &Event) -> bool;
}

/// Port for deciding whether an event's content is worth sending to the
/// similarity service.
pub trait ContentPolicy: Send + Sync + Debug {
    /// Whether the event is eligible for similarity analysis.
    fn is_eligible(&self, event: &Event) -> bool;
}

/// Port for resolving group identifiers returned by the similarity service.
///
/// A `None` result is normal operation (the group may have been deleted
/// since the service indexed it), not an error.
pub trait GroupStore: Send + Sync + Debug {
    /// Look up a group by identifier.
    fn find_by_id(&self, id: GroupId) -> Option<Group>;
}

/// Error produced by a [`SimilarityTransport`].
///
/// Covers timeouts, network failures, unexpected statuses and decode
/// failures alike; the resolver treats them all the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Port for performing the external similarity request.
///
/// Implementations return the service's candidate sequence verbatim (it is
/// already ranked closest-first) and propagate failures; no recovery happens
/// at this layer. The transport is expected to enforce a deadline so a slow
/// service cannot stall ingestion.
pub trait SimilarityTransport: Send + Sync + Debug {
    /// Send the request and return the ranked candidates.
    fn send(
        &self,
        request: &SimilarIssuesRequest,
    ) -> Result<Vec<SimilarIssueCandidate>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::MissingOption("similarity.global-rate-limit");
        assert_eq!(
            missing.to_string(),
            "configuration option `similarity.global-rate-limit` is missing"
        );

        let invalid = ConfigError::InvalidOption {
            name: "similarity.circuit-breaker-config",
            reason: "error_limit must be positive".to_owned(),
        };
        assert!(invalid.to_string().contains("error_limit must be positive"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new("similarity rpc failed: connection refused");
        assert_eq!(
            err.to_string(),
            "similarity rpc failed: connection refused"
        );
    }
}
