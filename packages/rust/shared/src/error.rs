//! Error types for nbindex.
//!
//! Library crates use [`NbIndexError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Index building itself never fails: orphans, cycles and upstream scan
//! errors are data, not errors. These variants cover the boundary only
//! (reading inventories and config, writing files).

use std::path::PathBuf;

/// Top-level error type for all nbindex operations.
#[derive(Debug, thiserror::Error)]
pub enum NbIndexError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Inventory JSON could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Well-formed input that breaks a contract (e.g. duplicate page ids).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Index serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbIndexError>;

impl NbIndexError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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
        let err = NbIndexError::config("unreadable config");
        assert_eq!(err.to_string(), "config error: unreadable config");

        let err = NbIndexError::validation("duplicate page id 'p1' in section 's1'");
        assert!(err.to_string().contains("duplicate page id"));
    }

    #[test]
    fn io_error_mentions_path() {
        let err = NbIndexError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("missing.json"));
        assert!(msg.contains("gone"));
    }
}
