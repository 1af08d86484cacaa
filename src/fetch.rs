//! Download scheduling: bounded-concurrency streaming fetches to disk.

use crate::types::{DownloadOutcome, DownloadStatus, Event, Resolution, ResolvedTarget};
use futures::StreamExt;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Semaphore, broadcast};

/// Fetches resolved targets to the download directory under a concurrency cap.
///
/// The semaphore is independent of the resolution gate so a slow download
/// wave cannot starve resolution (and vice versa). Skip checks — unresolved
/// targets and files already on disk — happen before a permit is taken, since
/// they involve no network work.
pub struct DownloadScheduler {
    client: reqwest::Client,
    download_dir: PathBuf,
    limit: Arc<Semaphore>,
    event_tx: broadcast::Sender<Event>,
    // Distinguishes the scratch files of concurrent tasks that share a
    // destination filename
    part_seq: AtomicU64,
}

impl DownloadScheduler {
    /// Wire a scheduler from its collaborators.
    ///
    /// The client is expected to carry the per-request timeout; redirects are
    /// followed with reqwest's default policy.
    pub fn new(
        client: reqwest::Client,
        download_dir: PathBuf,
        limit: Arc<Semaphore>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            client,
            download_dir,
            limit,
            event_tx,
            part_seq: AtomicU64::new(0),
        }
    }

    /// Download every resolved target, yielding one outcome per input.
    ///
    /// Failures are per-item: an HTTP error, timeout, or write failure marks
    /// that one target `Failed` and leaves its siblings running. Existing
    /// destination files are never overwritten or deleted. Targets that
    /// resolve to the same filename within one batch are not deduplicated;
    /// each streams to its own scratch file and the last rename wins, so they
    /// fetch redundantly but cannot corrupt or delete each other's output.
    pub async fn download_all(&self, resolutions: &[Resolution]) -> Vec<DownloadOutcome> {
        join_all(
            resolutions
                .iter()
                .map(|resolution| self.download_one(resolution)),
        )
        .await
    }

    async fn download_one(&self, resolution: &Resolution) -> DownloadOutcome {
        let Resolution::Resolved(target) = resolution else {
            self.event_tx
                .send(Event::DownloadSkipped {
                    filename: None,
                    reason: "not resolved".to_string(),
                })
                .ok();
            return DownloadOutcome {
                target: resolution.clone(),
                status: DownloadStatus::Skipped {
                    reason: "not resolved".to_string(),
                },
            };
        };

        let dest = self.download_dir.join(&target.filename);

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            tracing::info!(filename = %target.filename, "File already exists, skipping");
            self.event_tx
                .send(Event::DownloadSkipped {
                    filename: Some(target.filename.clone()),
                    reason: "already exists".to_string(),
                })
                .ok();
            return DownloadOutcome {
                target: resolution.clone(),
                status: DownloadStatus::Skipped {
                    reason: "already exists".to_string(),
                },
            };
        }

        let _permit = match self.limit.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return self.failed(resolution, target, "download gate closed".to_string());
            }
        };

        self.event_tx
            .send(Event::DownloadStarted {
                filename: target.filename.clone(),
                url: target.url.clone(),
            })
            .ok();

        // Stream into a per-task scratch file, then rename. A failure can
        // only ever remove this task's own scratch file, never a completed
        // download sharing the destination name.
        let scratch = self.download_dir.join(format!(
            "{}.part{}",
            target.filename,
            self.part_seq.fetch_add(1, Ordering::Relaxed)
        ));

        let result = match self.fetch_to_file(target, &scratch).await {
            Ok(()) => tokio::fs::rename(&scratch, &dest).await.map_err(|e| {
                format!("Failed to move '{}' into place: {}", dest.display(), e)
            }),
            Err(reason) => Err(reason),
        };

        match result {
            Ok(()) => {
                tracing::info!(filename = %target.filename, "Downloaded");
                self.event_tx
                    .send(Event::DownloadComplete {
                        filename: target.filename.clone(),
                    })
                    .ok();
                DownloadOutcome {
                    target: resolution.clone(),
                    status: DownloadStatus::Success,
                }
            }
            Err(reason) => {
                // Drop the truncated scratch file so nothing half-written
                // lingers in the download directory
                let _ = tokio::fs::remove_file(&scratch).await;
                self.failed(resolution, target, reason)
            }
        }
    }

    fn failed(
        &self,
        resolution: &Resolution,
        target: &ResolvedTarget,
        reason: String,
    ) -> DownloadOutcome {
        tracing::error!(filename = %target.filename, reason = %reason, "Download failed");
        self.event_tx
            .send(Event::DownloadFailed {
                filename: target.filename.clone(),
                reason: reason.clone(),
            })
            .ok();
        DownloadOutcome {
            target: resolution.clone(),
            status: DownloadStatus::Failed { reason },
        }
    }

    /// Stream the payload to disk without buffering it in memory.
    async fn fetch_to_file(
        &self,
        target: &ResolvedTarget,
        dest: &Path,
    ) -> std::result::Result<(), String> {
        tracing::info!(filename = %target.filename, url = %target.url, "Starting download");

        let response = self.client.get(&target.url).send().await.map_err(|e| {
            if e.is_timeout() {
                format!("Timeout fetching '{}'", target.url)
            } else if e.is_connect() {
                format!("Connection failed for '{}': {}", target.url, e)
            } else {
                format!("Request failed for '{}': {}", target.url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {} {}", status, target.url));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                format!("Failed to create directory '{}': {}", parent.display(), e)
            })?;
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| format!("Failed to create '{}': {}", dest.display(), e))?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| format!("Stream error from '{}': {}", target.url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("Failed to write '{}': {}", dest.display(), e))?;
        }

        file.flush()
            .await
            .map_err(|e| format!("Failed to flush '{}': {}", dest.display(), e))?;

        Ok(())
    }
}
