//! The search provider seam.
//!
//! The catalog/search protocol itself is an external collaborator: callers
//! plug in any [`SearchProvider`] implementation (an HTTP catalog client, a
//! local index, a test double). The pipeline only relies on the contract
//! below.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One search-result item returned by a [`SearchProvider`].
///
/// Records are read-only once returned. Providers differ in how they shape
/// mirror links, so `mirrors` is kept loosely typed and validated by the
/// resolver: it is usable when it is a JSON object (optionally nested under a
/// `"mirrors"` key), and only string-valued entries count as URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Display title of the record, when the provider supplies one
    #[serde(default)]
    pub title: Option<String>,

    /// File extension of the payload (e.g. "epub"), when known
    #[serde(default)]
    pub extension: Option<String>,

    /// Mirror links, in whatever shape the provider uses
    #[serde(default)]
    pub mirrors: serde_json::Value,
}

/// Pluggable search capability used by the resolution stage.
///
/// Contract: both methods return an empty vec (not an error) when nothing
/// matches. Errors are reserved for query failures (network, parse); the
/// resolver recovers from them per title.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for a term, restricted to records with the given extension.
    ///
    /// Matching is not required to be exact.
    async fn search_by_title_filtered(
        &self,
        term: &str,
        extension: &str,
    ) -> Result<Vec<CandidateRecord>>;

    /// Unfiltered title search, used as a fallback when the filtered query
    /// comes back empty.
    async fn search_by_title(&self, term: &str) -> Result<Vec<CandidateRecord>>;
}
