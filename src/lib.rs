//! # shelf-dl
//!
//! Library for batch book downloads: resolves a list of titles to concrete
//! download URLs through a pluggable search provider, then fetches the
//! payloads to disk — both stages under bounded concurrency, with durable
//! per-title result caching and priority-ordered mirror fallback.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Pluggable search** - the catalog protocol lives behind a trait;
//!   bring your own provider
//! - **Failure-tolerant** - one title failing to resolve or download never
//!   aborts the batch
//! - **Event-driven** - consumers subscribe to progress events, no polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use shelf_dl::{CandidateRecord, Config, Result, SearchProvider, ShelfDownloader};
//! use std::sync::Arc;
//!
//! struct MyCatalog;
//!
//! #[async_trait::async_trait]
//! impl SearchProvider for MyCatalog {
//!     async fn search_by_title_filtered(
//!         &self,
//!         _term: &str,
//!         _extension: &str,
//!     ) -> Result<Vec<CandidateRecord>> {
//!         // Query your catalog here
//!         Ok(vec![])
//!     }
//!
//!     async fn search_by_title(&self, _term: &str) -> Result<Vec<CandidateRecord>> {
//!         Ok(vec![])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let downloader = ShelfDownloader::new(Config::default(), Arc::new(MyCatalog)).await?;
//!
//!     let titles = vec!["The Women".to_string(), "Funny Story".to_string()];
//!     let summary = downloader.run(&titles).await?;
//!
//!     println!(
//!         "downloaded {} of {} resolved titles",
//!         summary.downloaded, summary.resolved
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Durable resolution cache with TTL
pub mod cache;
/// Configuration types
pub mod config;
/// Batch orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Download scheduling and streaming fetches
pub mod fetch;
/// Search provider seam
pub mod provider;
/// Resolution scheduling and caching
pub mod resolve;
/// Title-to-mirror resolution
pub mod resolver;
/// Core types and events
pub mod types;
/// Filename helpers
pub mod utils;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use cache::ResultCache;
pub use config::Config;
pub use downloader::ShelfDownloader;
pub use error::{DatabaseError, Error, Result};
pub use fetch::DownloadScheduler;
pub use provider::{CandidateRecord, SearchProvider};
pub use resolve::ResolutionScheduler;
pub use resolver::Resolver;
pub use types::{
    BatchSummary, DownloadOutcome, DownloadStatus, Event, Resolution, ResolvedTarget,
};
pub use utils::sanitize_filename;
