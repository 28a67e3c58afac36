//! Gate decisions and blocker tags.

use std::fmt;

/// Why the gate blocked (or did not block) a similarity call.
///
/// The string forms produced by [`Blocker::as_str`] are a compatibility
/// contract: downstream dashboards and tests match on them, so they must not
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Blocker {
    /// Nothing blocked; the call may be made.
    None,
    /// The project has similarity grouping disabled.
    FeatureDisabled,
    /// The fingerprint mixes the default sentinel with custom tokens.
    HybridFingerprint,
    /// A fully customized fingerprint. Carries the fingerprint variant's
    /// type tag.
    CustomizedFingerprint(String),
    /// The event content is not eligible for similarity analysis.
    ContentIneligible,
    /// The operator killswitch is active.
    Killswitch,
    /// The circuit breaker guarding the similarity service is broken.
    CircuitBreaker,
    /// The global rate limit was exceeded.
    GlobalRateLimit,
    /// The per-project rate limit was exceeded.
    ProjectRateLimit,
}

impl Blocker {
    /// Stable tag used in metrics and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Blocker::None => "none",
            Blocker::FeatureDisabled => "feature-disabled",
            Blocker::HybridFingerprint => "hybrid-fingerprint",
            Blocker::CustomizedFingerprint(variant_type) => variant_type,
            Blocker::ContentIneligible => "content-ineligible",
            Blocker::Killswitch => "killswitch",
            Blocker::CircuitBreaker => "circuit-breaker",
            Blocker::GlobalRateLimit => "global-rate-limit",
            Blocker::ProjectRateLimit => "project-rate-limit",
        }
    }
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`GroupingGate::decide`](crate::application::gate::GroupingGate::decide).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingDecision {
    /// Whether the similarity call may be made.
    pub allowed: bool,
    /// What blocked the call. [`Blocker::None`] when allowed.
    pub blocker: Blocker,
}

impl GroupingDecision {
    /// An allowing decision.
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            blocker: Blocker::None,
        }
    }

    /// A blocking decision attributed to `blocker`.
    pub fn blocked(blocker: Blocker) -> Self {
        Self {
            allowed: false,
            blocker,
        }
    }
}
