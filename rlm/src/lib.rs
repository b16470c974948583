//! rlm - retrieve context from large files
//!
//! Keeps large text corpora out of an agent's context window and lets it pull
//! back only what it needs: bounded search hits, byte-range peeks and
//! fixed-size chunks on disk.
//!
//! # Layout
//!
//! ```text
//! <workspace>/
//! ├── .git/
//! ├── .rlm/
//! │   ├── config.json      # {"context_dir": "..."}
//! │   └── chunks/          # default chunk output
//! └── large context files/ # default context directory
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rlm::{ConfigResolver, SearchBounds, SearchEngine, SearchQuery, detect_workspace_root};
//!
//! let root = detect_workspace_root(None)?;
//! let resolved = ConfigResolver::from_env().resolve(&root, None)?;
//! let result = SearchEngine::new().search(
//!     &resolved.context_dir,
//!     &SearchQuery::fixed("RLM").with_ignore_case(true),
//!     SearchBounds::default(),
//! )?;
//! ```

pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod output;
pub mod peek;
pub mod search;
pub mod walk;

pub use chunk::{ChunkOptions, write_chunks};
pub use config::{ConfigResolver, ConfigSource, ResolvedConfig, detect_workspace_root};
pub use error::{Result, RlmError};
pub use files::{FileEntry, list_files};
pub use peek::{PeekEnd, PeekSlice, peek};
pub use search::{QueryMode, SearchBounds, SearchEngine, SearchMatch, SearchQuery, SearchResult, search_dir};
pub use walk::DirectoryWalker;
