//! Configuration types for shelf-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for [`ShelfDownloader`]
///
/// Every field has a sensible default, so `Config::default()` works out of
/// the box. Durations are stored as plain seconds for friendly JSON/TOML
/// serialization; use [`Config::request_timeout`] and [`Config::cache_ttl`]
/// for `Duration` values.
///
/// [`ShelfDownloader`]: crate::downloader::ShelfDownloader
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory resolved payloads are written to (default: "./downloaded_books")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Path of the SQLite file backing the resolution cache
    /// (default: "./shelf-dl.cache.db")
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Maximum concurrent in-flight resolutions (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_resolutions: usize,

    /// Maximum concurrent in-flight downloads (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Per-request timeout in seconds, applied to every network call
    /// (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Mirror names tried in order when selecting a download URL.
    ///
    /// The ordering reflects historical mirror reliability; ties are broken
    /// by list position, never by the provider's map order.
    #[serde(default = "default_preferred_mirrors")]
    pub preferred_mirrors: Vec<String>,

    /// Preferred file extension used for filtered searches and as the
    /// filename fallback when a record carries none (default: "epub")
    #[serde(default = "default_preferred_extension")]
    pub preferred_extension: String,

    /// How long cached resolutions (including not-found results) stay live,
    /// in seconds (default: 24 hours)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Config {
    /// Per-request network timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Time-to-live for cached resolution results
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Validate settings that would otherwise stall a batch forever
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_resolutions == 0 {
            return Err(Error::Config {
                message: "max_concurrent_resolutions must be at least 1".to_string(),
                key: Some("max_concurrent_resolutions".to_string()),
            });
        }
        if self.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            cache_path: default_cache_path(),
            max_concurrent_resolutions: default_max_concurrent(),
            max_concurrent_downloads: default_max_concurrent(),
            request_timeout_secs: default_request_timeout_secs(),
            preferred_mirrors: default_preferred_mirrors(),
            preferred_extension: default_preferred_extension(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloaded_books")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./shelf-dl.cache.db")
}

fn default_max_concurrent() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_preferred_mirrors() -> Vec<String> {
    ["GET", "Cloudflare", "IPFS.io", "Libgen.rs", "Libgen.li"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_preferred_extension() -> String {
    "epub".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60 * 24
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.max_concurrent_resolutions, 5);
        assert_eq!(config.max_concurrent_downloads, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.preferred_extension, "epub");
        assert_eq!(config.preferred_mirrors[0], "GET");
        config.validate().unwrap();
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = Config {
            max_concurrent_downloads: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("max_concurrent_downloads"));
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.cache_ttl_secs, 86_400);
        assert_eq!(
            config.preferred_mirrors,
            vec!["GET", "Cloudflare", "IPFS.io", "Libgen.rs", "Libgen.li"]
        );
    }
}
