//! Directory traversal with exclusion rules
//!
//! One walker serves both the file lister and the search engine so the two
//! can never disagree about which files belong to the context directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// Directory names that are never descended into, at any depth
pub const SKIPPED_DIRS: &[&str] = &[".git", ".rlm", "node_modules"];

/// What to do with a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDecision {
    /// Visit the entry (and descend, for directories)
    Descend,
    /// Leave the entry out; directories are still descended into
    SkipEntry,
    /// Leave the entry and everything beneath it out
    SkipSubtree,
}

/// Exclusion policy shared by listing and searching: hidden entries and
/// well-known tooling directories are skipped.
pub fn default_policy(name: &str, is_dir: bool) -> WalkDecision {
    if is_dir {
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name) {
            return WalkDecision::SkipSubtree;
        }
        return WalkDecision::Descend;
    }
    if name.starts_with('.') {
        return WalkDecision::SkipEntry;
    }
    WalkDecision::Descend
}

/// Depth-first walker over the regular files of a tree, in file-name order
pub struct DirectoryWalker<F = fn(&str, bool) -> WalkDecision> {
    root: PathBuf,
    policy: F,
}

impl DirectoryWalker {
    /// Walker using [`default_policy`]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_policy(root, default_policy)
    }
}

impl<F> DirectoryWalker<F>
where
    F: Fn(&str, bool) -> WalkDecision,
{
    pub fn with_policy(root: impl Into<PathBuf>, policy: F) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn decide(&self, entry: &DirEntry) -> WalkDecision {
        // The root is never excluded, whatever its name
        if entry.depth() == 0 {
            return WalkDecision::Descend;
        }
        let name = entry.file_name().to_string_lossy();
        (self.policy)(&name, entry.file_type().is_dir())
    }

    /// Iterate the files the policy admits.
    ///
    /// Symlinks are not followed into directories; a symlink pointing at a
    /// regular file is yielded like a file. The first traversal error is
    /// yielded as `Err` and callers are expected to stop there.
    pub fn files(&self) -> impl Iterator<Item = Result<DirEntry>> + '_ {
        debug!(root = %self.root.display(), "DirectoryWalker::files: called");
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.decide(entry) != WalkDecision::SkipSubtree)
            .filter_map(move |entry| match entry {
                Err(e) => Some(Err(e.into())),
                Ok(entry) => {
                    if !is_regular_file(&entry) {
                        return None;
                    }
                    if self.decide(&entry) == WalkDecision::SkipEntry {
                        debug!(path = %entry.path().display(), "DirectoryWalker::files: skipping entry");
                        return None;
                    }
                    Some(Ok(entry))
                }
            })
    }
}

fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    file_type.is_symlink() && fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false)
}
