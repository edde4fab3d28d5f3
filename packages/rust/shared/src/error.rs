//! Error types for topicloom.
//!
//! Library crates use [`TopicLoomError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all topicloom operations.
#[derive(Debug, thiserror::Error)]
pub enum TopicLoomError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside the search and generation backends.
    #[error("network error: {0}")]
    Network(String),

    /// Search backend unreachable, erroring, or returning garbage.
    /// Terminal for the owning topic; never retried.
    #[error("search error: {0}")]
    Search(String),

    /// Generation backend error for a single model variant.
    /// Triggers fallback to the next variant in the chain.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty root name, malformed tree, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TopicLoomError>;

impl TopicLoomError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TopicLoomError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = TopicLoomError::Search("HTTP 503".into());
        assert_eq!(err.to_string(), "search error: HTTP 503");

        let err = TopicLoomError::validation("root node has an empty name");
        assert!(err.to_string().contains("empty name"));
    }
}
