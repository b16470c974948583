//! Per-fragment matching for fixed and regex queries

use memchr::memmem;
use regex::bytes::{Regex, RegexBuilder};
use tracing::debug;

use super::{QueryMode, SearchQuery};
use crate::error::{Result, RlmError};

/// A compiled query
#[derive(Debug)]
pub enum Matcher {
    /// Case-sensitive substring
    Fixed(memmem::Finder<'static>),
    /// Regex queries, and fixed queries that ignore case
    Regex(Regex),
}

impl Matcher {
    /// Compile `query` once for a whole search
    pub fn new(query: &SearchQuery) -> Result<Self> {
        debug!(?query, "Matcher::new: called");
        if query.text.is_empty() {
            return Err(RlmError::InvalidQuery("query is required".to_string()));
        }

        let pattern = match (query.mode, query.ignore_case) {
            (QueryMode::Fixed, false) => {
                return Ok(Self::Fixed(memmem::Finder::new(query.text.as_bytes()).into_owned()));
            }
            (QueryMode::Fixed, true) => regex::escape(&query.text),
            (QueryMode::Regex, _) => query.text.clone(),
        };

        // Unicode case folding on the raw bytes keeps match offsets exact
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(query.ignore_case)
            .build()
            .map_err(|e| RlmError::InvalidQuery(e.to_string()))?;
        Ok(Self::Regex(regex))
    }

    /// Byte offset of the first match in `haystack`
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        match self {
            Self::Fixed(finder) => finder.find(haystack),
            Self::Regex(regex) => regex.find(haystack).map(|m| m.start()),
        }
    }
}
