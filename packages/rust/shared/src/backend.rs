//! Backend trait seams for the synthesis pipeline.
//!
//! The orchestrator drives three external collaborators — a search backend,
//! an article extractor, and a text-generation backend — through these
//! narrow interfaces. Concrete HTTP implementations live in the `search`,
//! `extract`, and `synthesis` crates; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SourceCandidate, TopicSummary};

/// Resolves a topic query into a small ranked set of source locators.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Return up to N candidates in the backend's relevance order.
    ///
    /// Errors are terminal for the owning topic and are never retried:
    /// a failed search is treated as "no usable sources".
    async fn resolve(&self, topic: &str) -> Result<Vec<SourceCandidate>>;
}

/// Fetches one source locator and extracts its readable article text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Best-effort extraction. Any failure — network, non-parseable
    /// content, extraction yielding nothing — returns an empty string;
    /// extraction never fails the owning topic.
    async fn extract(&self, url: &str) -> String;
}

/// Produces one polished paragraph for a topic from aggregated source text.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Never errors past its own boundary: variant failures are logged and
    /// chain exhaustion returns [`TopicSummary::Unavailable`].
    async fn synthesize(&self, topic: &str, sources: &str) -> TopicSummary;
}
