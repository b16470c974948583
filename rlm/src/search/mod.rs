//! Streaming search over a context directory
//!
//! Every query is a fresh linear scan: the directory is walked in file-name
//! order and each file is read fragment by fragment, so neither file size nor
//! line length affects memory use. At most one match is recorded per fragment.

mod fragment;
mod matcher;

pub use fragment::{
    BINARY_SAMPLE_SIZE, Fragment, FragmentReader, LinePosition, MAX_FRAGMENT_BYTES, READ_BUFFER_SIZE,
    is_likely_binary,
};
pub use matcher::Matcher;

use serde::{Deserialize, Serialize, Serializer};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{Result, RlmError};
use crate::walk::DirectoryWalker;

/// Default cap on matches across all files
pub const DEFAULT_MAX_MATCHES: usize = 50;

/// Default cap on matches within one file
pub const DEFAULT_MAX_PER_FILE: usize = 20;

/// Default snippet length in bytes
pub const DEFAULT_MAX_LINE_CHARS: usize = 800;

/// How the query text is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Literal substring
    #[default]
    Fixed,
    /// Regular expression
    Regex,
}

/// What to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub mode: QueryMode,
    pub ignore_case: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, mode: QueryMode) -> Self {
        Self {
            text: text.into(),
            mode,
            ignore_case: false,
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(text, QueryMode::Fixed)
    }

    pub fn regex(text: impl Into<String>) -> Self {
        Self::new(text, QueryMode::Regex)
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }
}

/// Result-count and snippet limits; zero means "use the default"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBounds {
    pub max_matches: usize,
    pub max_per_file: usize,
    pub max_line_chars: usize,
}

impl SearchBounds {
    pub fn new(max_matches: usize, max_per_file: usize, max_line_chars: usize) -> Self {
        Self {
            max_matches,
            max_per_file,
            max_line_chars,
        }
    }

    /// Replace unset limits with the defaults
    pub fn normalized(self) -> Self {
        fn or_default(value: usize, default: usize) -> usize {
            if value == 0 { default } else { value }
        }
        Self {
            max_matches: or_default(self.max_matches, DEFAULT_MAX_MATCHES),
            max_per_file: or_default(self.max_per_file, DEFAULT_MAX_PER_FILE),
            max_line_chars: or_default(self.max_line_chars, DEFAULT_MAX_LINE_CHARS),
        }
    }
}

/// A single hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub path: PathBuf,
    /// 1-based line number
    pub line: u64,
    /// 1-based byte column within the logical line
    pub column: u64,
    /// The matching fragment without its line terminator, truncated
    pub snippet: String,
}

/// Outcome of one search call
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub context_dir: PathBuf,
    pub matches: Vec<SearchMatch>,
    #[serde(rename = "scanned_files")]
    pub files_scanned: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// How scanning a single file ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanOutcome {
    Binary,
    Exhausted,
    PerFileCap,
    GlobalCap,
}

/// Fragment-streaming search engine
#[derive(Debug, Clone)]
pub struct SearchEngine {
    read_buffer_size: usize,
    max_fragment_bytes: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::with_buffer_sizes(READ_BUFFER_SIZE, MAX_FRAGMENT_BYTES)
    }

    /// Engine with non-default buffer sizes, mainly for exercising long lines
    pub fn with_buffer_sizes(read_buffer_size: usize, max_fragment_bytes: usize) -> Self {
        Self {
            read_buffer_size,
            max_fragment_bytes,
        }
    }

    /// Search every eligible file under `directory`.
    ///
    /// Stops the whole traversal as soon as `max_matches` is reached; no file
    /// after the one holding the last match is opened.
    pub fn search(&self, directory: &Path, query: &SearchQuery, bounds: SearchBounds) -> Result<SearchResult> {
        debug!(directory = %directory.display(), ?query, ?bounds, "SearchEngine::search: called");
        if directory.as_os_str().is_empty() {
            return Err(RlmError::MissingDirectory);
        }
        let matcher = Matcher::new(query)?;
        let bounds = bounds.normalized();
        let started = Instant::now();

        let mut matches = Vec::new();
        let mut files_scanned = 0usize;

        for entry in DirectoryWalker::new(directory).files() {
            let entry = entry?;
            files_scanned += 1;

            let outcome = self.scan_file(entry.path(), &matcher, &bounds, &mut matches)?;
            debug!(path = %entry.path().display(), ?outcome, "SearchEngine::search: file done");
            if outcome == ScanOutcome::GlobalCap {
                break;
            }
        }

        info!(
            matches = matches.len(),
            files_scanned,
            directory = %directory.display(),
            "Search complete"
        );
        Ok(SearchResult {
            query: query.text.clone(),
            context_dir: directory.to_path_buf(),
            matches,
            files_scanned,
            elapsed: started.elapsed(),
        })
    }

    fn scan_file(
        &self,
        path: &Path,
        matcher: &Matcher,
        bounds: &SearchBounds,
        matches: &mut Vec<SearchMatch>,
    ) -> Result<ScanOutcome> {
        let mut file = File::open(path).map_err(|e| RlmError::io(path, e))?;
        if is_likely_binary(&mut file).map_err(|e| RlmError::io(path, e))? {
            debug!(path = %path.display(), "SearchEngine::scan_file: binary, skipping");
            return Ok(ScanOutcome::Binary);
        }
        file.seek(SeekFrom::Start(0)).map_err(|e| RlmError::io(path, e))?;

        let mut reader = FragmentReader::with_capacity(self.read_buffer_size, self.max_fragment_bytes, file);
        let mut position = LinePosition::default();
        let mut in_file = 0usize;

        loop {
            if matches.len() >= bounds.max_matches {
                return Ok(ScanOutcome::GlobalCap);
            }
            if in_file >= bounds.max_per_file {
                return Ok(ScanOutcome::PerFileCap);
            }

            let Some(fragment) = reader.next_fragment().map_err(|e| RlmError::io(path, e))? else {
                return Ok(ScanOutcome::Exhausted);
            };

            position = position.enter();
            if let Some(offset) = matcher.find(fragment.bytes) {
                in_file += 1;
                matches.push(SearchMatch {
                    path: path.to_path_buf(),
                    line: position.line(),
                    column: position.column_at(offset),
                    snippet: snippet(fragment.bytes, bounds.max_line_chars),
                });
            }
            position = position.leave(fragment.bytes.len(), fragment.terminated);
        }
    }
}

/// Search with the default engine
pub fn search_dir(directory: &Path, query: &SearchQuery, bounds: SearchBounds) -> Result<SearchResult> {
    SearchEngine::new().search(directory, query, bounds)
}

/// Strip trailing CR/LF and truncate to `max` bytes
fn snippet(fragment: &[u8], max: usize) -> String {
    let end = fragment
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |last| last + 1);
    String::from_utf8_lossy(&fragment[..end.min(max)]).into_owned()
}
