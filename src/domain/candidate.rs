//! Similarity candidates and the outcome metadata written onto events.

use crate::domain::event::GroupId;
use serde::{Deserialize, Serialize};

/// Metadata map key under which the similarity outcome is recorded.
pub const SIMILARITY_METADATA_KEY: &str = "similarity";

/// Version tag of the similarity model, stored alongside results so that
/// stale outcomes can be told apart after a model upgrade.
pub const SIMILARITY_MODEL_VERSION: &str = "v0";

/// A pre-existing issue group the similarity service suggests an event
/// belongs to.
///
/// Candidate sequences returned by the service are always ordered with the
/// closest match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarIssueCandidate {
    /// Primary grouping hash of the suggested parent group.
    pub parent_hash: String,
    /// Identifier of the suggested parent group.
    pub parent_group_id: GroupId,
    /// Embedding distance between the stacktraces (smaller is closer).
    pub stacktrace_distance: f64,
    /// Embedding distance between the event messages (smaller is closer).
    pub message_distance: f64,
    /// Whether the service considers the match close enough to group on.
    pub should_group: bool,
}

/// The similarity outcome recorded on an event after a successful call,
/// serialized under [`SIMILARITY_METADATA_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMetadata {
    /// Full candidate sequence, closest match first. Empty means no match.
    pub results: Vec<SimilarIssueCandidate>,
    /// Model version the results were produced with.
    pub similarity_model_version: String,
}

impl SimilarityMetadata {
    /// Wrap a candidate sequence with the current model version tag.
    pub fn from_results(results: Vec<SimilarIssueCandidate>) -> Self {
        Self {
            results,
            similarity_model_version: SIMILARITY_MODEL_VERSION.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_serialization_field_names() {
        let candidate = SimilarIssueCandidate {
            parent_hash: "abc123".to_owned(),
            parent_group_id: GroupId(9),
            stacktrace_distance: 0.4,
            message_distance: 0.2,
            should_group: false,
        };

        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["parent_hash"], "abc123");
        assert_eq!(value["parent_group_id"], 9);
        assert_eq!(value["stacktrace_distance"], 0.4);
        assert_eq!(value["message_distance"], 0.2);
        assert_eq!(value["should_group"], false);
    }

    #[test]
    fn test_from_results_tags_model_version() {
        let metadata = SimilarityMetadata::from_results(vec![]);
        assert!(metadata.results.is_empty());
        assert_eq!(metadata.similarity_model_version, SIMILARITY_MODEL_VERSION);
    }
}
