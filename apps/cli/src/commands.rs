//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use topicloom_core::pipeline::{
    PipelineOptions, ProgressReporter, SynthesisOutcome, synthesize_tree,
};
use topicloom_extract::{ArticleExtractor, ExtractOptions};
use topicloom_search::{SearchOptions, SearchResolver};
use topicloom_shared::{
    AppConfig, TopicNode, config_file_path, init_config, load_config, require_api_key,
};
use topicloom_synthesis::{FallbackSynthesizer, GenerationOptions};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// topicloom — synthesize a hierarchical document from a topic tree.
#[derive(Parser)]
#[command(
    name = "topicloom",
    version,
    about = "Turn a topic hierarchy into a fully sourced, synthesized Markdown document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Synthesize a document from a topic tree JSON file.
    Generate {
        /// Path to the topic tree (nested JSON records with name/children).
        input: PathBuf,

        /// Write the document here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Assembly mode: leaf (content at leaves only) or all.
        #[arg(short, long)]
        mode: Option<String>,

        /// Maximum topics processed simultaneously.
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Delay in ms before each topic task (backend politeness).
        #[arg(long)]
        pacing_ms: Option<u64>,

        /// Per-topic deadline in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "topicloom=info",
        1 => "topicloom=debug",
        _ => "topicloom=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            input,
            out,
            mode,
            concurrency,
            pacing_ms,
            timeout_secs,
        } => {
            cmd_generate(
                &input,
                out.as_deref(),
                mode.as_deref(),
                concurrency,
                pacing_ms,
                timeout_secs,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn cmd_generate(
    input: &std::path::Path,
    out: Option<&std::path::Path>,
    mode: Option<&str>,
    concurrency: Option<usize>,
    pacing_ms: Option<u64>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    // Merge CLI flags over the loaded config.
    let mut config = load_config()?;
    if let Some(mode) = mode {
        config.defaults.mode = mode.to_string();
    }
    if let Some(concurrency) = concurrency {
        config.defaults.concurrency = concurrency;
    }
    if let Some(pacing_ms) = pacing_ms {
        config.defaults.pacing_ms = pacing_ms;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.defaults.task_timeout_secs = timeout_secs;
    }

    // Validate both API keys before doing anything.
    let search_key = require_api_key(&config.search.api_key_env)?;
    let generation_key = require_api_key(&config.generation.api_key_env)?;

    // Parse the input tree.
    let content = std::fs::read_to_string(input)
        .map_err(|e| eyre!("cannot read {}: {e}", input.display()))?;
    let tree: TopicNode = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid topic tree in {}: {e}", input.display()))?;

    info!(
        input = %input.display(),
        topics = tree.node_count(),
        mode = %config.defaults.mode,
        "generating document"
    );

    // Wire up the concrete backends.
    let resolver = SearchResolver::new(SearchOptions {
        endpoint: config.search.endpoint.clone(),
        api_key: search_key,
        max_results: config.defaults.max_sources,
        timeout_secs: config.search.timeout_secs,
    })?;

    let extractor = ArticleExtractor::new(ExtractOptions::default())?;

    let synthesizer = FallbackSynthesizer::new(GenerationOptions {
        endpoint: config.generation.endpoint.clone(),
        api_key: generation_key,
        models: config.generation.models.clone(),
        timeout_secs: config.generation.timeout_secs,
    })?;

    let options = PipelineOptions::from_config(&config)?;
    let reporter = CliProgress::new();

    let outcome = synthesize_tree(
        &tree,
        Arc::new(resolver),
        Arc::new(extractor),
        Arc::new(synthesizer),
        &options,
        &reporter,
    )
    .await?;

    match out {
        Some(path) => {
            std::fs::write(path, &outcome.document)
                .map_err(|e| eyre!("cannot write {}: {e}", path.display()))?;

            println!();
            println!("  Document generated!");
            println!("  Run:          {}", outcome.run_id);
            println!("  Topics:       {}", outcome.topics_total);
            println!("  Generated:    {}", outcome.topics_generated);
            println!("  Placeholders: {}", outcome.topics_placeholder);
            println!("  Output:       {}", path.display());
            println!("  Time:         {:.1}s", outcome.elapsed.as_secs_f64());
            println!();
        }
        None => {
            // Keep stdout clean for the document itself.
            print!("{}", outcome.document);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn topic_settled(&self, topic: &str, generated: bool, current: usize, total: usize) {
        let marker = if generated { "ok" } else { "placeholder" };
        self.spinner
            .set_message(format!("[{current}/{total}] {topic} ({marker})"));
    }

    fn done(&self, _outcome: &SynthesisOutcome) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("created {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let path = config_file_path()?;
    let config: AppConfig = load_config()?;

    println!("# resolved config ({})", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
