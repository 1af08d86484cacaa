//! Batch orchestration: wires the cache, resolver, and both schedulers into
//! one two-stage run.

use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::DownloadScheduler;
use crate::provider::SearchProvider;
use crate::resolve::ResolutionScheduler;
use crate::resolver::Resolver;
use crate::types::{BatchSummary, DownloadOutcome, DownloadStatus, Event, Resolution};
use std::sync::Arc;
use tokio::sync::{Semaphore, broadcast};

/// Main entry point: resolves a batch of titles and downloads the results.
///
/// All shared state — the durable result cache, the event channel, and one
/// admission semaphore per stage — is constructed here and injected into the
/// schedulers; there are no process-wide singletons.
pub struct ShelfDownloader {
    config: Arc<Config>,
    cache: Arc<ResultCache>,
    event_tx: broadcast::Sender<Event>,
    resolutions: ResolutionScheduler,
    downloads: DownloadScheduler,
}

impl ShelfDownloader {
    /// Create a downloader instance.
    ///
    /// Validates the configuration, creates the download directory, opens
    /// (or creates) the cache database, and builds the HTTP client with the
    /// configured per-request timeout. Redirects are followed with reqwest's
    /// default policy.
    pub async fn new(config: Config, provider: Arc<dyn SearchProvider>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let cache = Arc::new(ResultCache::open(&config.cache_path).await?);

        // Broadcast channel for progress events; subscribers are optional
        let (event_tx, _rx) = broadcast::channel(1000);

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let resolver = Arc::new(Resolver::new(
            provider,
            config.preferred_mirrors.clone(),
            config.preferred_extension.clone(),
        ));

        // Independent gates per stage: a slow download wave must not block
        // resolution of the next batch, and vice versa
        let resolve_limit = Arc::new(Semaphore::new(config.max_concurrent_resolutions));
        let download_limit = Arc::new(Semaphore::new(config.max_concurrent_downloads));

        let resolutions = ResolutionScheduler::new(
            resolver,
            cache.clone(),
            resolve_limit,
            config.cache_ttl(),
            event_tx.clone(),
        );
        let downloads = DownloadScheduler::new(
            client,
            config.download_dir.clone(),
            download_limit,
            event_tx.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            cache,
            event_tx,
            resolutions,
            downloads,
        })
    }

    /// Run one batch: resolve every title, then download every resolved
    /// target, and report a summary.
    ///
    /// The download stage starts only after resolution has fully completed;
    /// the stages are never interleaved. Per-item failures are folded into
    /// the summary — the only fatal condition is an empty title list.
    pub async fn run(&self, titles: &[String]) -> Result<BatchSummary> {
        if titles.is_empty() {
            return Err(Error::EmptyBatch);
        }

        tracing::info!(titles = titles.len(), "Starting batch");

        let resolutions = self.resolutions.resolve_all(titles).await;
        let outcomes = self.downloads.download_all(&resolutions).await;

        let summary = summarize(&resolutions, &outcomes);
        tracing::info!(
            resolved = summary.resolved,
            not_found = summary.not_found,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch complete"
        );

        self.event_tx.send(Event::BatchComplete { summary }).ok();

        Ok(summary)
    }

    /// Resolve a batch without downloading anything.
    ///
    /// Outcomes come back in input order and are cached exactly as in a full
    /// run, so a later [`run`](Self::run) within the TTL reuses them.
    pub async fn resolve_only(&self, titles: &[String]) -> Result<Vec<Resolution>> {
        if titles.is_empty() {
            return Err(Error::EmptyBatch);
        }
        Ok(self.resolutions.resolve_all(titles).await)
    }

    /// Subscribe to batch progress events.
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. Events are buffered (1000), and a subscriber that
    /// falls behind receives a `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration (cheap Arc clone)
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Access the result cache, e.g. for maintenance
    /// ([`purge_expired`](ResultCache::purge_expired),
    /// [`invalidate`](ResultCache::invalidate)).
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

/// Tally a batch's resolutions and download outcomes into summary counts
fn summarize(resolutions: &[Resolution], outcomes: &[DownloadOutcome]) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for resolution in resolutions {
        match resolution {
            Resolution::Resolved(_) => summary.resolved += 1,
            Resolution::NotFound => summary.not_found += 1,
        }
    }

    for outcome in outcomes {
        match outcome.status {
            DownloadStatus::Success => summary.downloaded += 1,
            DownloadStatus::Skipped { .. } => summary.skipped += 1,
            DownloadStatus::Failed { .. } => summary.failed += 1,
        }
    }

    summary
}
