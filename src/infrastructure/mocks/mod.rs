//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of application logic.

pub mod clock;
pub mod group_store;
pub mod options;
pub mod transport;

pub use clock::MockClock;
pub use group_store::MockGroupStore;
pub use options::{MockContentPolicy, MockKillswitch, MockOptions};
pub use transport::MockTransport;
