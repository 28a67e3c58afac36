//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of similarity-based
//! grouping:
//! - Events, projects and issue groups
//! - Grouping hashes and their named variants
//! - Fingerprint customization detection
//! - Gate decisions and blocker tags
//! - Similarity candidates and outcome metadata
//!
//! All types in this layer are pure and easily testable.

pub mod candidate;
pub mod decision;
pub mod event;
pub mod fingerprint;
pub mod hashes;
