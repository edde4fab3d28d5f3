//! topicloom CLI — topic-tree content synthesis tool.
//!
//! Turns a topic hierarchy (nested JSON) into an enriched hierarchical
//! Markdown document, sourcing and synthesizing content per topic.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
