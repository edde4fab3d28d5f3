//! Application configuration for topicloom.
//!
//! User config lives at `~/.topicloom/topicloom.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicLoomError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "topicloom.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".topicloom";

// ---------------------------------------------------------------------------
// Config structs (matching topicloom.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global pipeline defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search backend settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Generation backend settings.
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum topic tasks processed simultaneously.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Source candidates retained per topic.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Fixed delay in ms before each topic task starts work (backend
    /// politeness knob; 0 disables pacing).
    #[serde(default)]
    pub pacing_ms: u64,

    /// Per-topic deadline in seconds. Expiry records the placeholder.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,

    /// Assembly mode: "leaf" (content at leaves only) or "all".
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_sources: default_max_sources(),
            pacing_ms: 0,
            task_timeout_secs: default_task_timeout(),
            mode: default_mode(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}
fn default_max_sources() -> usize {
    3
}
fn default_task_timeout() -> u64 {
    120
}
fn default_mode() -> String {
    "leaf".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Serper-compatible search endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Timeout for search requests in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".into()
}
fn default_search_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_search_timeout() -> u64 {
    10
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,

    /// Ordered model fallback chain, tried first to last.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Timeout for generation requests in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            api_key_env: default_generation_key_env(),
            models: default_models(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_generation_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}
fn default_generation_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_models() -> Vec<String> {
    vec![
        "google/gemini-2.0-flash-001".into(),
        "moonshotai/kimi-k2.5".into(),
        "meta-llama/llama-3.3-70b-instruct".into(),
    ]
}
fn default_generation_timeout() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.topicloom/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TopicLoomError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.topicloom/topicloom.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicLoomError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TopicLoomError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TopicLoomError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TopicLoomError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TopicLoomError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key named by `api_key_env`, erroring when unset or empty.
pub fn require_api_key(api_key_env: &str) -> Result<String> {
    match std::env::var(api_key_env) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(TopicLoomError::config(format!(
            "API key not found. Set the {api_key_env} environment variable."
        ))),
    }
}
