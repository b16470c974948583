//! Workspace root detection

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, RlmError};

/// Directory whose presence marks a repository root
pub const REPO_MARKER: &str = ".git";

/// Find the nearest ancestor of `start` (or of the current directory) that
/// contains a `.git` directory.
///
/// Falls back to the absolutized starting directory when no marker exists
/// between it and the filesystem root.
pub fn detect_workspace_root(start: Option<&Path>) -> Result<PathBuf> {
    debug!(?start, "detect_workspace_root: called");
    let start = match start.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => std::path::absolute(path).map_err(|e| RlmError::io(path, e))?,
        None => std::env::current_dir().map_err(|e| RlmError::io(".", e))?,
    };

    for dir in start.ancestors() {
        if dir.join(REPO_MARKER).is_dir() {
            debug!(root = %dir.display(), "detect_workspace_root: marker found");
            return Ok(dir.to_path_buf());
        }
    }

    debug!(root = %start.display(), "detect_workspace_root: no marker, using start");
    Ok(start)
}
