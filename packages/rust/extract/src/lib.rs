//! Readable-article extraction from source locators.
//!
//! Fetches a candidate URL with a browser-like User-Agent (some sites block
//! obvious bots), selects the main content container, converts it to clean
//! Markdown via `htmd`, and runs a small cleanup pipeline. Every failure
//! mode — network error, non-success status, nothing extractable — yields
//! an empty string: extraction silently degrades and never fails the
//! owning topic, and is attempted exactly once per candidate.

mod cleanup;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, instrument, warn};

use topicloom_shared::{ContentExtractor, Result, TopicLoomError};

/// Browser-like User-Agent sent with fetch requests to reduce blocking.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default timeout in seconds for fetch requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Content containers tried in priority order when locating article text.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".content",
    "#content",
    "body",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the article extractor.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// ArticleExtractor
// ---------------------------------------------------------------------------

/// Best-effort article text extractor for source candidates.
pub struct ArticleExtractor {
    client: Client,
}

impl ArticleExtractor {
    /// Create a new extractor with the given options.
    pub fn new(options: ExtractOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(std::time::Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| TopicLoomError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch the document at `url` and extract its readable text.
    /// Returns an empty string on any failure.
    #[instrument(skip(self))]
    pub async fn extract_url(&self, url: &str) -> String {
        let html = match self.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "fetch failed, skipping candidate");
                return String::new();
            }
        };

        let text = extract_article(&html);
        if text.is_empty() {
            debug!(url, "extraction yielded no readable content");
        } else {
            debug!(url, len = text.len(), "article extracted");
        }

        text
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TopicLoomError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopicLoomError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| TopicLoomError::Network(format!("{url}: body read failed: {e}")))
    }
}

#[async_trait]
impl ContentExtractor for ArticleExtractor {
    async fn extract(&self, url: &str) -> String {
        self.extract_url(url).await
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the readable article text from an HTML document as clean
/// Markdown. Returns an empty string when nothing useful is found.
pub fn extract_article(html: &str) -> String {
    let content_html = select_content_html(html);
    if content_html.trim().is_empty() {
        return String::new();
    }

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg"])
        .build();

    let raw_markdown = match converter.convert(&content_html) {
        Ok(md) => md,
        Err(e) => {
            debug!(error = %e, "markdown conversion failed");
            return String::new();
        }
    };

    cleanup::run_pipeline(&raw_markdown)
}

/// Pick the main content container, stripping site chrome.
fn select_content_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    for sel_str in CONTENT_SELECTORS {
        if let Ok(selector) = scraper::Selector::parse(sel_str) {
            if let Some(el) = doc.select(&selector).next() {
                return el.inner_html();
            }
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_article_prefers_article_element() {
        let html = r#"<html><body>
            <nav><a href="/">Home</a></nav>
            <article><h1>Topic</h1><p>The body text.</p></article>
            <footer>Copyright 2024</footer>
        </body></html>"#;

        let text = extract_article(html);
        assert!(text.contains("The body text."));
        assert!(!text.contains("Copyright 2024"));
        assert!(!text.contains("Home"));
    }

    #[test]
    fn extract_article_falls_back_to_body() {
        let html = "<html><body><h1>Plain</h1><p>Body content.</p></body></html>";
        let text = extract_article(html);
        assert!(text.contains("Plain"));
        assert!(text.contains("Body content."));
    }

    #[test]
    fn extract_article_empty_document_yields_empty() {
        assert_eq!(extract_article("<html><body></body></html>"), "");
        assert_eq!(extract_article(""), "");
    }

    #[test]
    fn extract_article_output_is_markdown() {
        let html = r#"<html><body><main>
            <h2>Section</h2>
            <p>Text with a <a href="https://example.com/ref">reference link</a>.</p>
        </main></body></html>"#;

        let text = extract_article(html);
        assert!(text.contains("## Section"));
        assert!(text.contains("[reference link](https://example.com/ref)"));
        assert!(!text.contains("<p>"));
    }

    #[tokio::test]
    async fn extract_url_success() {
        let server = wiremock::MockServer::start().await;

        let page = r#"<html><body><main>
            <h1>Remote Page</h1>
            <p>Fetched content.</p>
        </main></body></html>"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/page"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let extractor = ArticleExtractor::new(ExtractOptions::default()).unwrap();
        let text = extractor.extract_url(&format!("{}/page", server.uri())).await;

        assert!(text.contains("Fetched content."));
    }

    #[tokio::test]
    async fn extract_url_sends_browser_user_agent() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::header("User-Agent", BROWSER_USER_AGENT))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>ok</p></body></html>"),
            )
            .mount(&server)
            .await;

        let extractor = ArticleExtractor::new(ExtractOptions::default()).unwrap();
        let text = extractor.extract_url(&server.uri()).await;
        assert!(text.contains("ok"));
    }

    #[tokio::test]
    async fn extract_url_non_success_status_yields_empty() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let extractor = ArticleExtractor::new(ExtractOptions::default()).unwrap();
        let text = extractor.extract_url(&format!("{}/blocked", server.uri())).await;
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn extract_url_unreachable_host_yields_empty() {
        let extractor = ArticleExtractor::new(ExtractOptions { timeout_secs: 2 }).unwrap();
        // Port 9 (discard) is almost certainly closed.
        let text = extractor.extract_url("http://127.0.0.1:9/nothing").await;
        assert_eq!(text, "");
    }
}
