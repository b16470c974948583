//! Text and JSON projections of command results

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::files::FileEntry;
use crate::search::SearchResult;

/// Listing as emitted by `files --format json`
#[derive(Debug, Serialize)]
pub struct FilesReport<'a> {
    pub context_dir: &'a Path,
    pub files: &'a [FileEntry],
}

/// Chunking outcome as emitted by `chunk --format json`
#[derive(Debug, Serialize)]
pub struct ChunkReport<'a> {
    #[serde(rename = "in")]
    pub input: &'a Path,
    pub out_dir: &'a Path,
    pub chunks: &'a [PathBuf],
}

/// Pretty-printed JSON with a trailing newline
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

/// One `path:line:snippet` line per match
pub fn search_text(result: &SearchResult) -> String {
    let mut out = String::new();
    for m in &result.matches {
        let _ = writeln!(out, "{}:{}:{}", m.path.display(), m.line, m.snippet);
    }
    out
}

pub fn files_text(files: &[FileEntry]) -> String {
    paths_text(files.iter().map(|f| f.path.as_path()))
}

pub fn paths_text<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    let mut out = String::new();
    for path in paths {
        let _ = writeln!(out, "{}", path.display());
    }
    out
}

pub fn config_text(resolved: &ResolvedConfig) -> String {
    let global = resolved
        .global_config_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut out = String::from("rlm config\n");
    let _ = writeln!(out, "  workspace_root: {}", resolved.workspace_root.display());
    let _ = writeln!(out, "  global_config: {}", global);
    let _ = writeln!(out, "  workspace_config: {}", resolved.workspace_config_path.display());
    let _ = writeln!(out, "  context_dir: {}", resolved.context_dir.display());
    let _ = writeln!(out, "  source: {}", resolved.source);
    out
}
