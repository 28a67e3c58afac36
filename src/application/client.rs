//! Client assembling and issuing similarity requests.

use crate::application::ports::{SimilarityTransport, TransportError};
use crate::domain::candidate::SimilarIssueCandidate;
use crate::domain::event::Event;
use crate::domain::hashes::PrimaryHashes;
use serde::Serialize;
use std::sync::Arc;

/// Referrer tag identifying this call site to the similarity service.
pub const INGEST_REFERRER: &str = "ingest";

/// Wire request for a similar-issues lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarIssuesRequest {
    /// The event being matched.
    pub event_id: String,
    /// The event's primary grouping hash.
    pub hash: String,
    /// The owning project.
    pub project_id: u64,
    /// Flattened stacktrace text derived from the grouping variants.
    pub stacktrace: String,
    /// Event title, null bytes stripped.
    pub message: String,
    /// Type of the top-level exception, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    /// How many nearest neighbors to return.
    pub k: usize,
    /// Fixed call-site tag for service-side observability.
    pub referrer: String,
}

/// Issues similarity requests through an injected transport.
///
/// This layer only assembles the request; failures propagate verbatim to
/// the resolver, which is the single place that recovers from them.
#[derive(Debug, Clone)]
pub struct SimilarityClient {
    transport: Arc<dyn SimilarityTransport>,
}

impl SimilarityClient {
    /// Create a client over the given transport.
    pub fn new(transport: Arc<dyn SimilarityTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the event's `k` nearest neighbors, closest match first.
    pub fn fetch(
        &self,
        event: &Event,
        primary_hashes: &PrimaryHashes,
        k: usize,
    ) -> Result<Vec<SimilarIssueCandidate>, TransportError> {
        let hash = primary_hashes
            .primary_hash()
            .ok_or_else(|| TransportError::new("event has no grouping hashes"))?;

        let request = SimilarIssuesRequest {
            event_id: event.id.clone(),
            hash: hash.to_owned(),
            project_id: event.project_id.0,
            stacktrace: primary_hashes.stacktrace_string(),
            message: event.sanitized_title(),
            exception_type: event.exception_type.clone(),
            k,
            referrer: INGEST_REFERRER.to_owned(),
        };

        self.transport.send(&request)
    }
}
