//! Error types for rlm operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, listing, searching, peeking or chunking
#[derive(Debug, Error)]
pub enum RlmError {
    #[error("Workspace root is required")]
    MissingWorkspaceRoot,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Context directory is required")]
    MissingDirectory,

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RlmError {
    /// Wrap an I/O error with the path that produced it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, RlmError>;
