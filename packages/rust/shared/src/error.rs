//! Error types for Agency.
//!
//! Library crates use [`AgencyError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Agency operations.
#[derive(Debug, thiserror::Error)]
pub enum AgencyError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file pattern that could not be expanded.
    #[error("invalid file pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    /// Browser session failure (launch, navigation, page read).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Network/HTTP error while fetching a page or talking to a model server.
    #[error("network error: {0}")]
    Network(String),

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Terminal rendering error. Callers treat this as non-fatal.
    #[error("render error: {0}")]
    Render(String),

    /// Text generation error (request, status, or response decoding).
    #[error("generation error: {0}")]
    Generation(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AgencyError>;

impl AgencyError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Create a pattern error for a glob that failed to expand.
    pub fn pattern(pattern: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: msg.into(),
        }
    }
}
