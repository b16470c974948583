//! Listing the files of a context directory

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, RlmError};
use crate::walk::DirectoryWalker;

/// A listed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// List every file the search engine would scan, in the same order
pub fn list_files(directory: &Path) -> Result<Vec<FileEntry>> {
    debug!(directory = %directory.display(), "list_files: called");
    if directory.as_os_str().is_empty() {
        return Err(RlmError::MissingDirectory);
    }

    let files = DirectoryWalker::new(directory)
        .files()
        .map(|entry| -> Result<FileEntry> {
            let entry = entry?;
            let metadata = fs::metadata(entry.path()).map_err(|e| RlmError::io(entry.path(), e))?;
            Ok(FileEntry {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(count = files.len(), "list_files: done");
    Ok(files)
}

/// Interpret a file argument relative to the context directory unless it is absolute
pub fn resolve_in_context(context_dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        context_dir.join(file)
    }
}
