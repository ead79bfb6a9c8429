//! Error types for reviewscout.
//!
//! Library crates use [`ScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all reviewscout operations.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Browser session error: launch, navigation, or element wait timeout.
    #[error("session error: {0}")]
    Session(String),

    /// HTML parsing or field extraction error.
    #[error("extract error: {message}")]
    Extract { message: String },

    /// Document store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (empty query, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Operation interrupted by a cancellation request.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScoutError>;

impl ScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a session error from any displayable message.
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create an extract error from any displayable message.
    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extract {
            message: msg.into(),
        }
    }

    /// Create a storage error from any displayable message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
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
