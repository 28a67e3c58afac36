//! Events, projects and issue groups.
//!
//! An [`Event`] is the request-scoped input to the grouping gate. The only
//! mutation this crate ever performs on it is writing the similarity outcome
//! into its metadata map (see [`Event::set_similarity_metadata`]).

use crate::domain::candidate::{SimilarityMetadata, SIMILARITY_METADATA_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of the project an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an issue group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Minimal reference to an existing issue group.
///
/// The broader ingestion pipeline owns the full group record; this crate only
/// needs enough to hand a lookup result back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    /// The group's identifier.
    pub id: GroupId,
}

impl Group {
    /// Create a group reference.
    pub fn new(id: GroupId) -> Self {
        Self { id }
    }
}

/// An error event flowing through ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Unique event identifier.
    pub id: String,
    /// The project that owns this event.
    pub project_id: ProjectId,
    /// Event title. May contain null bytes; see [`Event::sanitized_title`].
    pub title: String,
    /// Ordered fingerprint tokens assigned during pre-grouping.
    pub fingerprint: Vec<String>,
    /// Type of the top-level exception, if the event has one.
    pub exception_type: Option<String>,
    /// Mutable metadata map. The similarity outcome is recorded here under
    /// [`SIMILARITY_METADATA_KEY`].
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Event {
    /// Create an event with an empty fingerprint and metadata map.
    pub fn new(id: impl Into<String>, project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id,
            title: title.into(),
            fingerprint: Vec::new(),
            exception_type: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the fingerprint tokens.
    pub fn with_fingerprint(mut self, fingerprint: Vec<String>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Set the top-level exception type.
    pub fn with_exception_type(mut self, exception_type: impl Into<String>) -> Self {
        self.exception_type = Some(exception_type.into());
        self
    }

    /// The event title with null bytes stripped.
    ///
    /// Titles occasionally arrive with embedded `\0` bytes, which the
    /// similarity service rejects.
    pub fn sanitized_title(&self) -> String {
        self.title.replace('\0', "")
    }

    /// Write the similarity outcome into the metadata map.
    pub fn set_similarity_metadata(
        &mut self,
        metadata: &SimilarityMetadata,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(metadata)?;
        self.metadata.insert(SIMILARITY_METADATA_KEY.to_owned(), value);
        Ok(())
    }

    /// Read back the similarity outcome, if one has been recorded.
    pub fn similarity_metadata(&self) -> Option<SimilarityMetadata> {
        let value = self.metadata.get(SIMILARITY_METADATA_KEY)?;
        serde_json::from_value(value.clone()).ok()
    }
}
