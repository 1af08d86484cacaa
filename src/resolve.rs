//! Resolution scheduling: bounded fan-out over a title batch with caching.

use crate::cache::ResultCache;
use crate::resolver::Resolver;
use crate::types::{Event, Resolution};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, broadcast};

/// Runs the [`Resolver`] over a whole batch under a concurrency cap.
///
/// The semaphore is an injected admission gate owned by the orchestrator;
/// no resolution bypasses it. Cache consultation happens under the same
/// permit as the provider call it guards.
pub struct ResolutionScheduler {
    resolver: Arc<Resolver>,
    cache: Arc<ResultCache>,
    limit: Arc<Semaphore>,
    cache_ttl: Duration,
    event_tx: broadcast::Sender<Event>,
}

impl ResolutionScheduler {
    /// Wire a scheduler from its collaborators.
    pub fn new(
        resolver: Arc<Resolver>,
        cache: Arc<ResultCache>,
        limit: Arc<Semaphore>,
        cache_ttl: Duration,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            resolver,
            cache,
            limit,
            cache_ttl,
            event_tx,
        }
    }

    /// Resolve every title, yielding exactly one outcome per title.
    ///
    /// The output order matches the input order even though resolutions
    /// complete out of order. There is no error path: per-title failures are
    /// already folded into [`Resolution::NotFound`] by the resolver, and
    /// cache failures degrade to a miss.
    pub async fn resolve_all(&self, titles: &[String]) -> Vec<Resolution> {
        join_all(titles.iter().map(|title| self.resolve_one(title))).await
    }

    async fn resolve_one(&self, title: &str) -> Resolution {
        let _permit = match self.limit.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Semaphore closed — nothing sensible left to do for this title
                tracing::error!(title, "Resolution gate closed unexpectedly");
                return Resolution::NotFound;
            }
        };

        let key = cache_key(title);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(title, "Resolution served from cache");
                self.emit_outcome(title, &cached);
                return cached;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(title, error = %e, "Cache lookup failed, resolving from provider");
            }
        }

        self.event_tx
            .send(Event::Resolving {
                title: title.to_string(),
            })
            .ok();

        let resolution = self.resolver.resolve(title).await;

        // Misses are cached too, so a title that found nothing today is not
        // re-queried until the TTL elapses.
        if let Err(e) = self.cache.set(&key, &resolution, self.cache_ttl).await {
            tracing::warn!(title, error = %e, "Failed to store resolution in cache");
        }

        self.emit_outcome(title, &resolution);
        resolution
    }

    fn emit_outcome(&self, title: &str, resolution: &Resolution) {
        let event = match resolution {
            Resolution::Resolved(target) => Event::Resolved {
                title: title.to_string(),
                url: target.url.clone(),
            },
            Resolution::NotFound => Event::TitleNotFound {
                title: title.to_string(),
            },
        };
        self.event_tx.send(event).ok();
    }
}

/// Cache key for one title's resolution outcome.
pub(crate) fn cache_key(title: &str) -> String {
    format!("download_info_{title}")
}
