//! Topic synthesis via a chat-completions backend with a model fallback chain.
//!
//! One request per model variant, tried in configured order until a result
//! is accepted. The chain is a resilience mechanism: a variant that errors
//! or returns unusable output is logged and skipped, never retried, and
//! exhaustion is a normal return path ([`TopicSummary::Unavailable`]),
//! not an error.

mod postprocess;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use topicloom_shared::{Result, Synthesizer, TopicLoomError, TopicSummary};

pub use postprocess::{REJECTION_PHRASE, is_acceptable, postprocess};

/// Default timeout in seconds for generation requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Delimiter between tagged source texts in the aggregated prompt input.
pub const SOURCE_DELIMITER: &str = "\n\n---\n\n";

/// Fixed instruction template prepended to every generation request.
const INSTRUCTION_TEMPLATE: &str = "\
You are a professional rewriting assistant with deep expertise in academic \
and editorial writing. Rewrite the source content below into exactly one \
clean, logically structured paragraph of formal, article-grade English.

Rules:
- Convert raw URLs and footnote-style references into Markdown inline \
hyperlinks with descriptive anchor text, each link used at most once.
- Do not mention missing sources, platform policies, or failure messages; \
if source material is thin, infer accurate context for the topic instead.
- No headings, section dividers, code fences, or metadata — a single \
cohesive paragraph only.";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the fallback synthesizer.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    /// Bearer token for the generation backend.
    pub api_key: String,
    /// Ordered model fallback chain, tried first to last.
    pub models: Vec<String>,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl GenerationOptions {
    /// Options for the given endpoint, key, and chain, with default timeout.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        models: Vec<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            models,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Subset of the chat completions response we care about.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate extracted candidate texts into one block of source material.
///
/// Each non-empty text is tagged with its origin locator and the blocks are
/// joined with [`SOURCE_DELIMITER`]. Empty extractions are filtered out.
pub fn aggregate_sources(sources: &[(String, String)]) -> String {
    sources
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(url, text)| format!("{text}\n\n({url})"))
        .collect::<Vec<_>>()
        .join(SOURCE_DELIMITER)
}

// ---------------------------------------------------------------------------
// FallbackSynthesizer
// ---------------------------------------------------------------------------

/// Chat-completions client iterating a fixed model fallback chain.
pub struct FallbackSynthesizer {
    options: GenerationOptions,
    client: Client,
}

impl FallbackSynthesizer {
    /// Create a new synthesizer with the given options.
    pub fn new(options: GenerationOptions) -> Result<Self> {
        if options.models.is_empty() {
            return Err(TopicLoomError::config(
                "generation fallback chain must contain at least one model",
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| TopicLoomError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { options, client })
    }

    /// Try each model in the chain; first accepted result wins.
    #[instrument(skip(self, sources))]
    async fn synthesize_inner(&self, topic: &str, sources: &str) -> TopicSummary {
        let prompt = build_prompt(topic, sources);

        for model in &self.options.models {
            match self.request_completion(model, &prompt).await {
                Ok(raw) => {
                    let text = postprocess(&raw);
                    if is_acceptable(&text) {
                        info!(topic, model, "synthesis accepted");
                        return TopicSummary::Generated(text);
                    }
                    warn!(topic, model, "rejected empty or failure-echo output");
                }
                Err(e) => {
                    warn!(topic, model, error = %e, "generation attempt failed");
                }
            }
        }

        info!(topic, "fallback chain exhausted");
        TopicSummary::Unavailable
    }

    /// One generation request against a single model variant.
    async fn request_completion(&self, model: &str, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(&self.options.endpoint)
            .bearer_auth(&self.options.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TopicLoomError::Synthesis(format!("{model}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopicLoomError::Synthesis(format!("{model}: HTTP {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TopicLoomError::Synthesis(format!("{model}: invalid response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TopicLoomError::Synthesis(format!("{model}: response has no choices")))
    }
}

#[async_trait]
impl Synthesizer for FallbackSynthesizer {
    async fn synthesize(&self, topic: &str, sources: &str) -> TopicSummary {
        self.synthesize_inner(topic, sources).await
    }
}

/// Combine the instruction template, topic, and aggregated source text.
fn build_prompt(topic: &str, sources: &str) -> String {
    format!("{INSTRUCTION_TEMPLATE}\n\nTopic: {topic}\n\nSource content:\n{sources}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_for(server: &wiremock::MockServer, models: &[&str]) -> GenerationOptions {
        GenerationOptions::new(
            format!("{}/chat/completions", server.uri()),
            "test-key",
            models.iter().map(|m| m.to_string()).collect(),
        )
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": content } } ]
        })
    }

    #[test]
    fn aggregate_tags_and_delimits_sources() {
        let sources = vec![
            ("https://a.example".to_string(), "Text A".to_string()),
            ("https://b.example".to_string(), String::new()),
            ("https://c.example".to_string(), "Text C".to_string()),
        ];

        let aggregated = aggregate_sources(&sources);
        assert_eq!(
            aggregated,
            "Text A\n\n(https://a.example)\n\n---\n\nText C\n\n(https://c.example)"
        );
    }

    #[test]
    fn aggregate_all_empty_yields_empty() {
        let sources = vec![("https://a.example".to_string(), String::new())];
        assert_eq!(aggregate_sources(&sources), "");
    }

    #[test]
    fn empty_chain_is_a_config_error() {
        let err = FallbackSynthesizer::new(GenerationOptions::new("http://x", "k", vec![]))
            .err()
            .expect("empty chain must be rejected");
        assert!(err.to_string().contains("at least one model"));
    }

    #[tokio::test]
    async fn first_variant_success_short_circuits() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "model": "primary" }),
            ))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(completion_body("A polished paragraph.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let synthesizer =
            FallbackSynthesizer::new(options_for(&server, &["primary", "backup"])).unwrap();
        let summary = synthesizer.synthesize_inner("Root > A", "some sources").await;

        assert_eq!(summary, TopicSummary::Generated("A polished paragraph.".into()));
    }

    #[tokio::test]
    async fn failed_variant_falls_through_to_next() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "model": "primary" }),
            ))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "model": "backup" }),
            ))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(completion_body("Backup paragraph.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let synthesizer =
            FallbackSynthesizer::new(options_for(&server, &["primary", "backup"])).unwrap();
        let summary = synthesizer.synthesize_inner("Root > B", "sources").await;

        assert_eq!(summary, TopicSummary::Generated("Backup paragraph.".into()));
    }

    #[tokio::test]
    async fn failure_echo_is_rejected_like_a_failure() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "model": "primary" }),
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                completion_body("Unfortunately, content Could Not Be Generated here."),
            ))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "model": "backup" }),
            ))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(completion_body("Real text.")),
            )
            .mount(&server)
            .await;

        let synthesizer =
            FallbackSynthesizer::new(options_for(&server, &["primary", "backup"])).unwrap();
        let summary = synthesizer.synthesize_inner("Root > C", "sources").await;

        assert_eq!(summary, TopicSummary::Generated("Real text.".into()));
    }

    #[tokio::test]
    async fn exhausted_chain_returns_unavailable() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let synthesizer =
            FallbackSynthesizer::new(options_for(&server, &["primary", "backup"])).unwrap();
        let summary = synthesizer.synthesize_inner("Root > D", "sources").await;

        assert_eq!(summary, TopicSummary::Unavailable);
    }

    #[tokio::test]
    async fn output_is_postprocessed() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(completion_body(
                "See [the entry]\n(https://example.com/e).\n\n---\n\nDone.",
            )))
            .mount(&server)
            .await;

        let synthesizer = FallbackSynthesizer::new(options_for(&server, &["only"])).unwrap();
        let summary = synthesizer.synthesize_inner("Root > E", "sources").await;

        assert_eq!(
            summary,
            TopicSummary::Generated("See [the entry](https://example.com/e).\nDone.".into())
        );
    }

    #[tokio::test]
    async fn prompt_carries_topic_and_sources() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_string_contains("Topic: Root > F"))
            .and(wiremock::matchers::body_string_contains("the source material"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(completion_body("ok")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let synthesizer = FallbackSynthesizer::new(options_for(&server, &["only"])).unwrap();
        let summary = synthesizer
            .synthesize_inner("Root > F", "the source material")
            .await;

        assert_eq!(summary, TopicSummary::Generated("ok".into()));
    }
}
