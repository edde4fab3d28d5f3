//! End-to-end synthesis pipeline: tree → sources → extraction → synthesis → document.
//!
//! One task per enumerated topic, admitted through a shared semaphore so at
//! most `concurrency` topics are in flight across the whole tree. Every
//! task settles with exactly one map entry — a generated paragraph or the
//! terminal placeholder — before the assembler runs; no single topic's
//! failure aborts the pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, instrument, warn};

use topicloom_shared::{
    AppConfig, ContentExtractor, Result, RunId, SourceResolver, Synthesizer, TopicLoomError,
    TopicNode, TopicPath, TopicSummary, walk,
};
use topicloom_synthesis::aggregate_sources;

use crate::assembler::{self, AssemblyMode};

/// Runtime pipeline options — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum topic tasks processed simultaneously.
    pub concurrency: usize,
    /// Fixed delay applied before each topic task starts work.
    pub pacing: Duration,
    /// Per-topic deadline; expiry records the placeholder.
    pub task_timeout: Duration,
    /// Which nodes contribute a text block to the document.
    pub mode: AssemblyMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            pacing: Duration::ZERO,
            task_timeout: Duration::from_secs(120),
            mode: AssemblyMode::LeavesOnly,
        }
    }
}

impl PipelineOptions {
    /// Build runtime options from the loaded application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            concurrency: config.defaults.concurrency,
            pacing: Duration::from_millis(config.defaults.pacing_ms),
            task_timeout: Duration::from_secs(config.defaults.task_timeout_secs),
            mode: AssemblyMode::parse(&config.defaults.mode)?,
        })
    }
}

/// Result of a completed pipeline invocation.
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// Identifier for this invocation (appears in logs).
    pub run_id: RunId,
    /// The assembled hierarchical document.
    pub document: String,
    /// Number of enumerated topics.
    pub topics_total: usize,
    /// Topics that settled with generated content.
    pub topics_generated: usize,
    /// Topics that settled with the terminal placeholder.
    pub topics_placeholder: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a topic task settles (success or placeholder).
    fn topic_settled(&self, topic: &str, generated: bool, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &SynthesisOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn topic_settled(&self, _topic: &str, _generated: bool, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &SynthesisOutcome) {}
}

/// Run the full synthesis pipeline over `tree`.
///
/// 1. Validate the input tree
/// 2. Enumerate topic paths
/// 3. Resolve / extract / synthesize each topic under bounded concurrency
/// 4. Assemble the document once every task has settled
#[instrument(skip_all, fields(root = %tree.name))]
pub async fn synthesize_tree(
    tree: &TopicNode,
    resolver: Arc<dyn SourceResolver>,
    extractor: Arc<dyn ContentExtractor>,
    synthesizer: Arc<dyn Synthesizer>,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<SynthesisOutcome> {
    if tree.name.trim().is_empty() {
        return Err(TopicLoomError::validation("root node has an empty name"));
    }
    if options.concurrency == 0 {
        return Err(TopicLoomError::validation("concurrency must be at least 1"));
    }

    let start = Instant::now();
    let run_id = RunId::new();

    let topics: Vec<TopicPath> = walk(tree).map(|(path, _)| path).collect();
    let topics_total = topics.len();

    info!(
        %run_id,
        topics = topics_total,
        concurrency = options.concurrency,
        "starting synthesis pipeline"
    );

    progress.phase("Synthesizing topics");

    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let summaries: Arc<Mutex<HashMap<TopicPath, TopicSummary>>> =
        Arc::new(Mutex::new(HashMap::with_capacity(topics_total)));

    let mut handles = Vec::with_capacity(topics_total);

    for path in topics {
        let semaphore = Arc::clone(&semaphore);
        let summaries = Arc::clone(&summaries);
        let resolver = Arc::clone(&resolver);
        let extractor = Arc::clone(&extractor);
        let synthesizer = Arc::clone(&synthesizer);
        let pacing = options.pacing;
        let task_timeout = options.task_timeout;

        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");

            if !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }

            let summary = match tokio::time::timeout(
                task_timeout,
                process_topic(&task_path, resolver, extractor, synthesizer),
            )
            .await
            {
                Ok(summary) => summary,
                Err(_) => {
                    warn!(topic = %task_path, "task deadline expired");
                    TopicSummary::Unavailable
                }
            };

            let generated = summary.is_generated();
            summaries.lock().await.insert(task_path, summary);
            generated
        });

        handles.push((path, handle));
    }

    // Join point: every topic settles before assembly.
    let mut topics_generated = 0;
    let mut topics_placeholder = 0;

    for (current, (path, handle)) in handles.into_iter().enumerate() {
        let generated = match handle.await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(topic = %path, error = %e, "topic task panicked");
                // Preserve the one-entry-per-topic invariant even on panic.
                summaries
                    .lock()
                    .await
                    .entry(path.clone())
                    .or_insert(TopicSummary::Unavailable);
                false
            }
        };

        if generated {
            topics_generated += 1;
        } else {
            topics_placeholder += 1;
        }

        progress.topic_settled(&path.as_query(), generated, current + 1, topics_total);
    }

    progress.phase("Assembling document");

    let document = {
        let map = summaries.lock().await;
        assembler::assemble(tree, &map, options.mode)
    };

    let outcome = SynthesisOutcome {
        run_id,
        document,
        topics_total,
        topics_generated,
        topics_placeholder,
        elapsed: start.elapsed(),
    };

    progress.done(&outcome);

    info!(
        run_id = %outcome.run_id,
        generated = outcome.topics_generated,
        placeholders = outcome.topics_placeholder,
        elapsed_ms = outcome.elapsed.as_millis(),
        "synthesis pipeline complete"
    );

    Ok(outcome)
}

/// Process one topic end to end. Always settles with a summary.
async fn process_topic(
    path: &TopicPath,
    resolver: Arc<dyn SourceResolver>,
    extractor: Arc<dyn ContentExtractor>,
    synthesizer: Arc<dyn Synthesizer>,
) -> TopicSummary {
    let topic = path.as_query();

    let candidates = match resolver.resolve(&topic).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(topic, error = %e, "source resolution failed");
            return TopicSummary::Unavailable;
        }
    };

    if candidates.is_empty() {
        debug!(topic, "no sources found");
        return TopicSummary::Unavailable;
    }

    // Fan out extraction per candidate; join in rank order so the
    // aggregated block is deterministic.
    let mut extraction_handles = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let extractor = Arc::clone(&extractor);
        extraction_handles.push(tokio::spawn(async move {
            let text = extractor.extract(&candidate.url).await;
            (candidate.url, text)
        }));
    }

    let mut extractions = Vec::with_capacity(extraction_handles.len());
    for handle in extraction_handles {
        match handle.await {
            Ok(pair) => extractions.push(pair),
            Err(e) => warn!(topic, error = %e, "extraction task panicked"),
        }
    }

    let sources = aggregate_sources(&extractions);
    if sources.is_empty() {
        debug!(topic, "all extractions empty, synthesizing without source material");
    }

    synthesizer.synthesize(&topic, &sources).await
}
