//! Blocking HTTP transport to the similarity service.
//!
//! Available with the `http-transport` feature. Posts the request as JSON to
//! the service's similar-issues endpoint and decodes the ranked candidate
//! list from the response body. All failure shapes (connect, timeout, bad
//! status, decode) collapse into [`TransportError`]; the resolver treats
//! them uniformly.

use crate::application::client::SimilarIssuesRequest;
use crate::application::ports::{SimilarityTransport, TransportError};
use crate::domain::candidate::SimilarIssueCandidate;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const SIMILAR_ISSUES_PATH: &str = "/v0/issues/similar-issues";

/// Default deadline for a similarity request. Ingestion sits on the hot
/// path, so a slow service must be cut off quickly.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking HTTP adapter for [`SimilarityTransport`].
#[derive(Debug, Clone)]
pub struct HttpSimilarityTransport {
    client: Client,
    endpoint: String,
}

impl HttpSimilarityTransport {
    /// Create a transport targeting the provided base endpoint (e.g.
    /// `http://similarity.internal:9091`) with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport with an explicit request deadline.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(TransportError::new("similarity endpoint must not be empty"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::new(format!("http client build failed: {err}")))?;
        Ok(Self { client, endpoint })
    }

    fn similar_issues_url(&self) -> String {
        format!(
            "{}{}",
            self.endpoint.trim_end_matches('/'),
            SIMILAR_ISSUES_PATH
        )
    }
}

impl SimilarityTransport for HttpSimilarityTransport {
    fn send(
        &self,
        request: &SimilarIssuesRequest,
    ) -> Result<Vec<SimilarIssueCandidate>, TransportError> {
        let response = self
            .client
            .post(self.similar_issues_url())
            .json(request)
            .send()
            .map_err(|err| TransportError::new(format!("similarity rpc failed: {err}")))?;
        if !response.status().is_success() {
            return Err(TransportError::new(format!(
                "similarity rpc returned status {}",
                response.status()
            )));
        }
        let wire: WireSimilarIssuesResponse = response
            .json()
            .map_err(|err| TransportError::new(format!("similarity rpc decode failed: {err}")))?;
        Ok(wire.responses)
    }
}

#[derive(Debug, Deserialize)]
struct WireSimilarIssuesResponse {
    #[serde(default)]
    responses: Vec<SimilarIssueCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let transport = HttpSimilarityTransport::new("http://similarity.internal:9091/").unwrap();
        assert_eq!(
            transport.similar_issues_url(),
            "http://similarity.internal:9091/v0/issues/similar-issues"
        );
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(HttpSimilarityTransport::new("  ").is_err());
    }

    #[test]
    fn test_missing_responses_field_decodes_to_empty() {
        let wire: WireSimilarIssuesResponse = serde_json::from_str("{}").unwrap();
        assert!(wire.responses.is_empty());
    }
}
