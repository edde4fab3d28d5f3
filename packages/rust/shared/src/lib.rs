//! Shared types, error model, and configuration for topicloom.
//!
//! This crate is the foundation depended on by all other topicloom crates.
//! It provides:
//! - [`TopicLoomError`] — the unified error type
//! - Domain types ([`TopicNode`], [`TopicPath`], [`SourceCandidate`], [`TopicSummary`])
//! - The topic path enumerator ([`walk`])
//! - Backend trait seams ([`SourceResolver`], [`ContentExtractor`], [`Synthesizer`])
//! - Configuration ([`AppConfig`], config loading)

pub mod backend;
pub mod config;
pub mod error;
pub mod tree;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use backend::{ContentExtractor, SourceResolver, Synthesizer};
pub use config::{
    AppConfig, DefaultsConfig, GenerationConfig, SearchConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, require_api_key,
};
pub use error::{Result, TopicLoomError};
pub use tree::{TopicWalk, walk};
pub use types::{
    PATH_SEPARATOR, PLACEHOLDER_TEXT, RunId, SourceCandidate, TopicNode, TopicPath, TopicSummary,
};
