//! Core types and events for shelf-dl

use serde::{Deserialize, Serialize};

/// A concrete download target produced by resolving one title.
///
/// Immutable once created: the resolution stage produces it, the download
/// stage consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Display title, taken from the provider record when available,
    /// otherwise the original search term
    pub display_title: String,
    /// Chosen mirror URL
    pub url: String,
    /// Destination filename (sanitized title plus extension), relative to the
    /// configured download directory
    pub filename: String,
}

/// Outcome of resolving one title.
///
/// `NotFound` is a first-class outcome, not an error: it is cached with the
/// same TTL as a successful resolution so repeated misses do not re-query the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// The title resolved to a downloadable target
    Resolved(ResolvedTarget),
    /// No usable record or mirror URL was found for the title
    NotFound,
}

impl Resolution {
    /// Whether this resolution carries a download target
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// The resolved target, if any
    pub fn target(&self) -> Option<&ResolvedTarget> {
        match self {
            Resolution::Resolved(target) => Some(target),
            Resolution::NotFound => None,
        }
    }
}

/// Status of one download attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Payload fetched and written to disk
    Success,
    /// Nothing was attempted (unresolved target or file already present)
    Skipped {
        /// Why the download was skipped
        reason: String,
    },
    /// The fetch or write failed; sibling downloads are unaffected
    Failed {
        /// HTTP status, transport error, or write error detail
        reason: String,
    },
}

/// Per-item result of the download stage
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    /// The resolution this outcome belongs to
    pub target: Resolution,
    /// What happened when the target was processed
    pub status: DownloadStatus,
}

/// Counts reported after a batch run completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Titles that resolved to a download target
    pub resolved: usize,
    /// Titles with no usable search result
    pub not_found: usize,
    /// Targets downloaded successfully
    pub downloaded: usize,
    /// Targets skipped (unresolved or already on disk)
    pub skipped: usize,
    /// Targets that failed to download
    pub failed: usize,
}

/// Events broadcast while a batch runs
///
/// Multiple subscribers are supported; events are dropped silently when no
/// subscriber is listening.
#[derive(Debug, Clone)]
pub enum Event {
    /// A title is being resolved against the search provider (cache miss)
    Resolving {
        /// The search term being resolved
        title: String,
    },
    /// A title resolved to a download URL
    Resolved {
        /// The search term that was resolved
        title: String,
        /// The chosen mirror URL
        url: String,
    },
    /// A title produced no usable result
    TitleNotFound {
        /// The search term that missed
        title: String,
    },
    /// A download has started
    DownloadStarted {
        /// Destination filename
        filename: String,
        /// Source URL
        url: String,
    },
    /// A download finished successfully
    DownloadComplete {
        /// Destination filename
        filename: String,
    },
    /// A download was skipped without any network activity
    DownloadSkipped {
        /// Destination filename, absent for unresolved targets
        filename: Option<String>,
        /// Why the download was skipped
        reason: String,
    },
    /// A download failed
    DownloadFailed {
        /// Destination filename
        filename: String,
        /// Failure detail
        reason: String,
    },
    /// The whole batch finished
    BatchComplete {
        /// Final outcome counts
        summary: BatchSummary,
    },
}
