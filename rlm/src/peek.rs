//! Byte-range extraction

use serde::Serialize;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, RlmError};

/// Bytes returned when no end offset is given
pub const DEFAULT_PEEK_BYTES: u64 = 8192;

/// Requested end of a peek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeekEnd {
    /// `start + DEFAULT_PEEK_BYTES`
    Default,
    /// End of file
    Eof,
    /// Exclusive byte offset
    At(u64),
}

impl PeekEnd {
    /// Map the command-line convention: negative is EOF, zero is the default
    pub fn from_offset(end: i64) -> Self {
        match end {
            e if e < 0 => Self::Eof,
            0 => Self::Default,
            e => Self::At(e as u64),
        }
    }
}

/// Effective byte range after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeekRange {
    pub start: u64,
    pub end: u64,
}

impl PeekRange {
    /// Clamp a request against a file of `size` bytes
    pub fn clamp(start: i64, end: PeekEnd, size: u64) -> Self {
        let start = start.max(0) as u64;
        let end = match end {
            PeekEnd::Eof => size,
            PeekEnd::Default => start.saturating_add(DEFAULT_PEEK_BYTES).min(size),
            PeekEnd::At(end) => end.min(size),
        };
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracted text and the range it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeekSlice {
    pub path: PathBuf,
    pub start: u64,
    pub end: u64,
    pub text: String,
}

/// Read the bytes `[start, end)` of `path`; invalid UTF-8 is replaced
pub fn peek(path: &Path, start: i64, end: PeekEnd) -> Result<PeekSlice> {
    debug!(path = %path.display(), start, ?end, "peek: called");
    let mut file = File::open(path).map_err(|e| RlmError::io(path, e))?;
    let size = file.metadata().map_err(|e| RlmError::io(path, e))?.len();
    let range = PeekRange::clamp(start, end, size);

    file.seek(SeekFrom::Start(range.start))
        .map_err(|e| RlmError::io(path, e))?;
    let mut bytes = Vec::with_capacity(range.len() as usize);
    file.take(range.len())
        .read_to_end(&mut bytes)
        .map_err(|e| RlmError::io(path, e))?;

    debug!(?range, read = bytes.len(), "peek: done");
    Ok(PeekSlice {
        path: path.to_path_buf(),
        start: range.start,
        end: range.end,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
