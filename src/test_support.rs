//! Shared test doubles for the resolution pipeline.

use crate::error::{Error, Result};
use crate::provider::{CandidateRecord, SearchProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Build a candidate record from its loose parts.
pub(crate) fn record(
    title: Option<&str>,
    extension: Option<&str>,
    mirrors: serde_json::Value,
) -> CandidateRecord {
    CandidateRecord {
        title: title.map(str::to_string),
        extension: extension.map(str::to_string),
        mirrors,
    }
}

/// A provider that replays fixed responses and counts calls.
///
/// Also tracks how many queries are in flight at once so tests can assert
/// the concurrency bound.
pub(crate) struct ScriptedProvider {
    filtered: Vec<CandidateRecord>,
    unfiltered: Vec<CandidateRecord>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    pub(crate) filtered_calls: AtomicUsize,
    pub(crate) unfiltered_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new(
        filtered: Vec<CandidateRecord>,
        unfiltered: Vec<CandidateRecord>,
    ) -> Self {
        Self {
            filtered,
            unfiltered,
            fail_with: None,
            delay: None,
            filtered_calls: AtomicUsize::new(0),
            unfiltered_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// A provider whose queries always fail.
    pub(crate) fn failing(message: &str) -> Self {
        let mut provider = Self::new(vec![], vec![]);
        provider.fail_with = Some(message.to_string());
        provider
    }

    /// Delay every query, giving concurrent calls time to overlap.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.filtered_calls.load(Ordering::SeqCst) + self.unfiltered_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, records: Vec<CandidateRecord>) -> Result<Vec<CandidateRecord>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.fail_with {
            Some(message) => Err(Error::Provider(message.clone())),
            None => Ok(records),
        }
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn search_by_title_filtered(
        &self,
        _term: &str,
        _extension: &str,
    ) -> Result<Vec<CandidateRecord>> {
        self.filtered_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(self.filtered.clone()).await
    }

    async fn search_by_title(&self, _term: &str) -> Result<Vec<CandidateRecord>> {
        self.unfiltered_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(self.unfiltered.clone()).await
    }
}

/// A provider that resolves every term to a URL derived from the term,
/// with a small per-term delay so completions land out of order.
pub(crate) struct EchoProvider;

#[async_trait]
impl SearchProvider for EchoProvider {
    async fn search_by_title_filtered(
        &self,
        term: &str,
        _extension: &str,
    ) -> Result<Vec<CandidateRecord>> {
        // Vary the delay by term so later titles can finish first
        let jitter = (term.len() * 7 % 23) as u64;
        tokio::time::sleep(Duration::from_millis(jitter)).await;

        Ok(vec![record(
            Some(term),
            Some("epub"),
            serde_json::json!({ "GET": format!("http://example.com/{term}.epub") }),
        )])
    }

    async fn search_by_title(&self, _term: &str) -> Result<Vec<CandidateRecord>> {
        Ok(vec![])
    }
}
