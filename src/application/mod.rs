//! Application layer: gate logic, orchestration, and the ports it needs.
//!
//! Everything here is infrastructure-agnostic. Side effects (time, counter
//! storage, option lookups, the similarity service itself) enter through the
//! traits in [`ports`], so the whole decision pipeline is testable with the
//! mocks under `infrastructure::mocks`.

pub mod circuit_breaker;
pub mod client;
pub mod gate;
pub mod metrics;
pub mod ports;
pub mod rate_limit;
pub mod resolver;
