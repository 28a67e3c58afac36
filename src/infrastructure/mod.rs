//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Counter storage (in-process maps, optionally Redis)
//! - Static option/killswitch/content-policy sources
//! - The HTTP transport to the similarity service (feature-gated)

pub mod clock;
pub mod options;
pub mod storage;

#[cfg(feature = "http-transport")]
pub mod http;

#[cfg(feature = "redis-limiter")]
pub mod redis_counters;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for testing
/// gate decisions and the resolve flow.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// similarity-gate = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
