//! Error types for shelf-dl
//!
//! Fatal errors are rare by design: a single title failing to resolve or a
//! single download failing is reported through [`Resolution::NotFound`] and
//! [`DownloadStatus::Failed`] rather than through this module, so one bad item
//! never aborts a batch.
//!
//! [`Resolution::NotFound`]: crate::types::Resolution::NotFound
//! [`DownloadStatus::Failed`]: crate::types::DownloadStatus::Failed

use thiserror::Error;

/// Result type alias for shelf-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shelf-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_downloads")
        key: Option<String>,
    },

    /// Result cache database operation failed
    #[error("cache error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Search provider query failed
    #[error("search provider error: {0}")]
    Provider(String),

    /// The batch was started with an empty title list
    #[error("the batch title list is empty")]
    EmptyBatch,
}

/// Result-cache database errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to the cache database
    #[error("failed to connect to cache database: {0}")]
    ConnectionFailed(String),

    /// Failed to create the cache schema
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}
