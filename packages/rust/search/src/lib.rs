//! Source resolution against a serper-style search backend.
//!
//! Given a topic query, asks the search backend for relevant pages and keeps
//! the top few result locators as [`SourceCandidate`]s. Over-fetching is
//! wasted cost, under-fetching degrades synthesis quality, so results are
//! truncated to a small fixed count. A failed search is terminal for the
//! owning topic and is never retried here: it means "no usable sources",
//! not a transient fault.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use topicloom_shared::{Result, SourceCandidate, SourceResolver, TopicLoomError};

/// Default number of candidates retained per topic.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Default timeout in seconds for search requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("topicloom/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the search resolver.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Serper-compatible search endpoint.
    pub endpoint: String,
    /// API key sent in the `X-API-KEY` header.
    pub api_key: String,
    /// Maximum candidates retained per topic.
    pub max_results: usize,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl SearchOptions {
    /// Options for the given endpoint and key, with default limits.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Subset of the search backend's JSON response we care about.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

/// One organic search result.
#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: String,
}

// ---------------------------------------------------------------------------
// SearchResolver
// ---------------------------------------------------------------------------

/// HTTP client for a serper-style search backend.
pub struct SearchResolver {
    options: SearchOptions,
    client: Client,
}

impl SearchResolver {
    /// Create a new resolver with the given options.
    pub fn new(options: SearchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| TopicLoomError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { options, client })
    }

    #[instrument(skip(self))]
    async fn resolve_inner(&self, topic: &str) -> Result<Vec<SourceCandidate>> {
        let response = self
            .client
            .post(&self.options.endpoint)
            .header("X-API-KEY", &self.options.api_key)
            .json(&serde_json::json!({ "q": topic }))
            .send()
            .await
            .map_err(|e| TopicLoomError::Search(format!("{topic}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopicLoomError::Search(format!("{topic}: HTTP {status}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| TopicLoomError::Search(format!("{topic}: invalid response: {e}")))?;

        let candidates: Vec<SourceCandidate> = parsed
            .organic
            .into_iter()
            .take(self.options.max_results)
            .enumerate()
            .map(|(rank, result)| SourceCandidate {
                url: result.link,
                rank,
            })
            .collect();

        debug!(topic, count = candidates.len(), "sources resolved");

        Ok(candidates)
    }
}

#[async_trait]
impl SourceResolver for SearchResolver {
    async fn resolve(&self, topic: &str) -> Result<Vec<SourceCandidate>> {
        self.resolve_inner(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_for(server: &wiremock::MockServer) -> SearchOptions {
        SearchOptions::new(format!("{}/search", server.uri()), "test-key")
    }

    #[tokio::test]
    async fn resolve_returns_ranked_candidates() {
        let server = wiremock::MockServer::start().await;

        let body = serde_json::json!({
            "organic": [
                { "link": "https://example.com/one", "title": "One" },
                { "link": "https://example.com/two", "title": "Two" },
            ]
        });

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/search"))
            .and(wiremock::matchers::header("X-API-KEY", "test-key"))
            .and(wiremock::matchers::body_json(
                serde_json::json!({ "q": "Root > A" }),
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let resolver = SearchResolver::new(options_for(&server)).unwrap();
        let candidates = resolver.resolve("Root > A").await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url, "https://example.com/one");
        assert_eq!(candidates[0].rank, 0);
        assert_eq!(candidates[1].rank, 1);
    }

    #[tokio::test]
    async fn resolve_truncates_to_max_results() {
        let server = wiremock::MockServer::start().await;

        let links: Vec<serde_json::Value> = (0..7)
            .map(|i| serde_json::json!({ "link": format!("https://example.com/{i}") }))
            .collect();

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "organic": links })),
            )
            .mount(&server)
            .await;

        let resolver = SearchResolver::new(options_for(&server)).unwrap();
        let candidates = resolver.resolve("anything").await.unwrap();

        assert_eq!(candidates.len(), DEFAULT_MAX_RESULTS);
        assert_eq!(candidates[2].url, "https://example.com/2");
    }

    #[tokio::test]
    async fn resolve_empty_organic_is_success() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            )
            .mount(&server)
            .await;

        let resolver = SearchResolver::new(options_for(&server)).unwrap();
        let candidates = resolver.resolve("obscure topic").await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn resolve_non_success_status_errors() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let resolver = SearchResolver::new(options_for(&server)).unwrap();
        let err = resolver.resolve("rate limited").await.unwrap_err();

        assert!(matches!(err, TopicLoomError::Search(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn resolve_malformed_body_errors() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string("not json at all"),
            )
            .mount(&server)
            .await;

        let resolver = SearchResolver::new(options_for(&server)).unwrap();
        let err = resolver.resolve("garbled").await.unwrap_err();
        assert!(matches!(err, TopicLoomError::Search(_)));
    }
}
