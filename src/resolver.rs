//! Title resolution: provider queries, mirror selection, filename building.

use crate::error::Result;
use crate::provider::{CandidateRecord, SearchProvider};
use crate::types::{Resolution, ResolvedTarget};
use crate::utils::sanitize_filename;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Resolves one title to a download target via the search provider.
///
/// A `Resolver` is stateless across calls; all shared state (cache,
/// concurrency gate) lives in the scheduler that drives it.
pub struct Resolver {
    provider: Arc<dyn SearchProvider>,
    priority_mirrors: Vec<String>,
    preferred_extension: String,
}

impl Resolver {
    /// Create a resolver over a search provider.
    ///
    /// `priority_mirrors` is the ordered list of mirror names tried first;
    /// `preferred_extension` drives the filtered query and the filename
    /// fallback.
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        priority_mirrors: Vec<String>,
        preferred_extension: String,
    ) -> Self {
        Self {
            provider,
            priority_mirrors,
            preferred_extension,
        }
    }

    /// Resolve a title to a download target.
    ///
    /// Never fails: provider errors and unusable records are logged and
    /// reported as [`Resolution::NotFound`], so one bad title cannot abort a
    /// batch. There are no retries within a call.
    pub async fn resolve(&self, title: &str) -> Resolution {
        match self.try_resolve(title).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!(title, error = %e, "Resolution failed");
                Resolution::NotFound
            }
        }
    }

    async fn try_resolve(&self, title: &str) -> Result<Resolution> {
        tracing::info!(title, "Searching for title");

        let mut records = self
            .provider
            .search_by_title_filtered(title, &self.preferred_extension)
            .await?;

        if records.is_empty() {
            records = self.provider.search_by_title(title).await?;
        }

        let Some(record) = records.into_iter().next() else {
            tracing::warn!(title, "No search results");
            return Ok(Resolution::NotFound);
        };

        Ok(self.resolve_record(title, &record))
    }

    /// Turn the first candidate record into a target, or `NotFound` when it
    /// carries no usable mirror URL.
    fn resolve_record(&self, title: &str, record: &CandidateRecord) -> Resolution {
        let Some(mirrors) = mirror_map(&record.mirrors) else {
            tracing::warn!(title, "Search result has no mirror map");
            return Resolution::NotFound;
        };

        let Some((mirror, url)) = self.select_mirror(mirrors) else {
            tracing::warn!(title, "No string-valued mirror URL in search result");
            return Resolution::NotFound;
        };

        tracing::info!(title, mirror, "Selected mirror");

        let extension = record
            .extension
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(&self.preferred_extension);

        let display_title = record
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title.to_string());

        let filename = format!("{}.{}", sanitize_filename(&display_title), extension);

        Resolution::Resolved(ResolvedTarget {
            display_title,
            url: url.to_string(),
            filename,
        })
    }

    /// Pick a mirror URL from the map.
    ///
    /// The priority list wins regardless of map iteration order; ties are
    /// broken by list position. When no priority name holds a string URL, the
    /// first string-valued entry in map iteration order is used — that order
    /// depends on the provider and is a documented limitation, not a bug.
    fn select_mirror<'a>(&'a self, mirrors: &'a Map<String, Value>) -> Option<(&'a str, &'a str)> {
        for name in &self.priority_mirrors {
            if let Some(url) = mirrors.get(name.as_str()).and_then(Value::as_str) {
                return Some((name.as_str(), url));
            }
        }

        mirrors
            .iter()
            .find_map(|(name, value)| value.as_str().map(|url| (name.as_str(), url)))
    }
}

/// Validate the loosely-typed mirror value from a provider record.
///
/// Accepts an object nested under a `"mirrors"` key, or the value itself when
/// it is an object. Anything else (null, array, string) is unusable.
fn mirror_map(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    if let Some(nested) = map.get("mirrors").and_then(Value::as_object) {
        return Some(nested);
    }
    Some(map)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, record};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn resolver(provider: ScriptedProvider) -> Resolver {
        Resolver::new(
            Arc::new(provider),
            crate::config::Config::default().preferred_mirrors,
            "epub".to_string(),
        )
    }

    #[tokio::test]
    async fn priority_mirror_beats_map_order() {
        // serde_json::Map iterates "Cloudflare" before "GET"; the priority
        // list must still pick GET.
        let provider = ScriptedProvider::new(
            vec![record(
                Some("The Women"),
                Some("epub"),
                json!({
                    "Cloudflare": "http://example/cf.epub",
                    "GET": "http://example/get.epub",
                }),
            )],
            vec![],
        );

        let resolution = resolver(provider).resolve("The Women").await;
        let target = resolution.target().unwrap();
        assert_eq!(target.url, "http://example/get.epub");
    }

    #[tokio::test]
    async fn lower_priority_mirror_used_when_higher_absent() {
        let provider = ScriptedProvider::new(
            vec![record(
                Some("Burn"),
                Some("epub"),
                json!({
                    "Libgen.li": "http://example/li.epub",
                    "Libgen.rs": "http://example/rs.epub",
                }),
            )],
            vec![],
        );

        let resolution = resolver(provider).resolve("Burn").await;
        assert_eq!(
            resolution.target().unwrap().url,
            "http://example/rs.epub",
            "Libgen.rs precedes Libgen.li in the priority list"
        );
    }

    #[tokio::test]
    async fn non_string_mirror_values_are_skipped() {
        let provider = ScriptedProvider::new(
            vec![record(
                Some("Martyr"),
                Some("epub"),
                json!({
                    "GET": 42,
                    "Cloudflare": "http://example/cf.epub",
                }),
            )],
            vec![],
        );

        let resolution = resolver(provider).resolve("Martyr").await;
        assert_eq!(resolution.target().unwrap().url, "http://example/cf.epub");
    }

    #[tokio::test]
    async fn falls_back_to_first_string_entry_without_priority_match() {
        let provider = ScriptedProvider::new(
            vec![record(
                Some("Sandwich"),
                Some("epub"),
                json!({
                    "Annas-Archive": "http://example/aa.epub",
                    "SomeOther": "http://example/other.epub",
                }),
            )],
            vec![],
        );

        let resolution = resolver(provider).resolve("Sandwich").await;
        assert_eq!(resolution.target().unwrap().url, "http://example/aa.epub");
    }

    #[tokio::test]
    async fn nested_mirrors_field_is_used() {
        let provider = ScriptedProvider::new(
            vec![record(
                Some("Water Moon"),
                Some("epub"),
                json!({
                    "mirrors": { "GET": "http://example/nested.epub" },
                    "md5": "abc123",
                }),
            )],
            vec![],
        );

        let resolution = resolver(provider).resolve("Water Moon").await;
        assert_eq!(resolution.target().unwrap().url, "http://example/nested.epub");
    }

    #[tokio::test]
    async fn unusable_mirror_shapes_resolve_to_not_found() {
        for mirrors in [json!(null), json!([1, 2]), json!("a string"), json!({})] {
            let provider =
                ScriptedProvider::new(vec![record(Some("x"), Some("epub"), mirrors)], vec![]);
            let resolution = resolver(provider).resolve("x").await;
            assert_eq!(resolution, Resolution::NotFound);
        }
    }

    #[tokio::test]
    async fn unfiltered_search_is_the_fallback() {
        let provider = ScriptedProvider::new(
            vec![],
            vec![record(
                Some("Blue Sisters"),
                Some("pdf"),
                json!({ "GET": "http://example/bs.pdf" }),
            )],
        );

        let resolution = resolver(provider).resolve("Blue Sisters").await;
        assert!(resolution.is_resolved());
    }

    #[tokio::test]
    async fn empty_results_from_both_queries_is_not_found() {
        let provider = Arc::new(ScriptedProvider::new(vec![], vec![]));
        let resolver = Resolver::new(
            provider.clone(),
            vec!["GET".to_string()],
            "epub".to_string(),
        );

        let resolution = resolver.resolve("Unknown Book").await;

        assert_eq!(resolution, Resolution::NotFound);
        assert_eq!(provider.filtered_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.unfiltered_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_error_is_recovered_as_not_found() {
        let provider = ScriptedProvider::failing("catalog unreachable");
        let resolution = resolver(provider).resolve("Funny Story").await;
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn only_the_first_record_is_considered() {
        let provider = ScriptedProvider::new(
            vec![
                record(Some("First"), Some("epub"), json!({})),
                record(
                    Some("Second"),
                    Some("epub"),
                    json!({ "GET": "http://example/second.epub" }),
                ),
            ],
            vec![],
        );

        // The first record has no mirrors; later records are never inspected.
        let resolution = resolver(provider).resolve("First Lie Wins").await;
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn filename_uses_sanitized_record_title_and_extension() {
        let provider = ScriptedProvider::new(
            vec![record(
                Some("We Solve Murders: A Novel"),
                Some("mobi"),
                json!({ "GET": "http://example/wsm.mobi" }),
            )],
            vec![],
        );

        let resolution = resolver(provider).resolve("We Solve Murders").await;
        let target = resolution.target().unwrap();
        assert_eq!(target.filename, "We_Solve_Murders_A_Novel.mobi");
        assert_eq!(target.display_title, "We Solve Murders: A Novel");
    }

    #[tokio::test]
    async fn missing_title_and_extension_fall_back_to_search_term_and_epub() {
        let provider = ScriptedProvider::new(
            vec![record(None, None, json!({ "GET": "http://example/x" }))],
            vec![],
        );

        let resolution = resolver(provider).resolve("You are Here").await;
        let target = resolution.target().unwrap();
        assert_eq!(target.display_title, "You are Here");
        assert_eq!(target.filename, "You_are_Here.epub");
    }
}
