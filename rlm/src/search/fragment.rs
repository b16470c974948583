//! Bounded line-fragment reading and position tracking
//!
//! A file is consumed one fragment at a time: a complete physical line
//! (terminator included) or, for lines longer than the fragment cap, a slice of
//! at most `max_fragment` bytes marked as unterminated. Memory per file stays
//! bounded by the buffer and the cap no matter how long a line is.

use memchr::memchr;
use std::io::{self, BufRead, BufReader, Read};

/// Capacity of the read buffer
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Longest fragment handed out for a single unterminated read
pub const MAX_FRAGMENT_BYTES: usize = 256 * 1024;

/// Bytes inspected by the binary heuristic
pub const BINARY_SAMPLE_SIZE: usize = 4096;

/// One step of the fragment reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub bytes: &'a [u8],
    /// The fragment ends with `\n`; otherwise more of the same line follows
    pub terminated: bool,
}

/// Reads a stream as a sequence of line fragments
pub struct FragmentReader<R> {
    inner: BufReader<R>,
    max_fragment: usize,
    fragment: Vec<u8>,
}

impl<R: Read> FragmentReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(READ_BUFFER_SIZE, MAX_FRAGMENT_BYTES, reader)
    }

    /// Reader with explicit buffer and fragment sizes; zero selects the default
    pub fn with_capacity(buffer_size: usize, max_fragment: usize, reader: R) -> Self {
        let buffer_size = if buffer_size == 0 { READ_BUFFER_SIZE } else { buffer_size };
        let max_fragment = if max_fragment == 0 { MAX_FRAGMENT_BYTES } else { max_fragment };
        Self {
            inner: BufReader::with_capacity(buffer_size, reader),
            max_fragment,
            fragment: Vec::new(),
        }
    }

    /// Next fragment, or `None` once the stream is exhausted
    pub fn next_fragment(&mut self) -> io::Result<Option<Fragment<'_>>> {
        self.fragment.clear();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                if self.fragment.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Fragment {
                    bytes: &self.fragment,
                    terminated: false,
                }));
            }

            let room = self.max_fragment - self.fragment.len();
            let window = &available[..available.len().min(room)];

            if let Some(newline) = memchr(b'\n', window) {
                self.fragment.extend_from_slice(&window[..=newline]);
                self.inner.consume(newline + 1);
                return Ok(Some(Fragment {
                    bytes: &self.fragment,
                    terminated: true,
                }));
            }

            let taken = window.len();
            self.fragment.extend_from_slice(window);
            self.inner.consume(taken);

            if self.fragment.len() >= self.max_fragment {
                return Ok(Some(Fragment {
                    bytes: &self.fragment,
                    terminated: false,
                }));
            }
        }
    }
}

/// Position of the reader within a file, threaded through each fragment.
///
/// `line` is 1-based once the first fragment is entered. `column_base` is the
/// byte offset of the current fragment within its logical line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinePosition {
    line: u64,
    column_base: u64,
    mid_line: bool,
}

impl LinePosition {
    /// Position at the start of the next fragment
    pub fn enter(self) -> Self {
        if self.mid_line {
            return self;
        }
        Self {
            line: self.line + 1,
            column_base: 0,
            mid_line: true,
        }
    }

    /// Position after a fragment of `len` bytes has been consumed
    pub fn leave(self, len: usize, terminated: bool) -> Self {
        if terminated {
            return Self {
                line: self.line,
                column_base: 0,
                mid_line: false,
            };
        }
        Self {
            line: self.line,
            column_base: self.column_base + len as u64,
            mid_line: true,
        }
    }

    pub fn line(self) -> u64 {
        self.line
    }

    /// 1-based column of a byte offset inside the current fragment
    pub fn column_at(self, offset: usize) -> u64 {
        self.column_base + offset as u64 + 1
    }
}

/// True when the first [`BINARY_SAMPLE_SIZE`] bytes contain a NUL.
///
/// Consumes up to the sample size from `reader`; callers rewind before
/// scanning.
pub fn is_likely_binary<R: Read>(reader: &mut R) -> io::Result<bool> {
    let mut sample = Vec::with_capacity(BINARY_SAMPLE_SIZE);
    reader.by_ref().take(BINARY_SAMPLE_SIZE as u64).read_to_end(&mut sample)?;
    Ok(memchr(0, &sample).is_some())
}
