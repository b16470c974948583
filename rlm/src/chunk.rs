//! Splitting a file into fixed-size, optionally overlapping chunks on disk

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, RlmError};

/// Default chunk size (200 000 bytes)
pub const DEFAULT_CHUNK_SIZE: usize = 200_000;

/// Default chunk file name prefix
pub const DEFAULT_PREFIX: &str = "chunk";

/// Options for writing chunks
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    /// Size of each chunk in bytes
    pub chunk_size: usize,
    /// Bytes shared between adjacent chunks
    pub overlap: usize,
    /// File name prefix, `<prefix>_NNNN.txt`
    pub prefix: String,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: 0,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl ChunkOptions {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RlmError::InvalidArgument("size must be > 0".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(RlmError::InvalidArgument("overlap must be >= 0 and < size".to_string()));
        }
        Ok(())
    }

    fn prefix(&self) -> &str {
        if self.prefix.is_empty() { DEFAULT_PREFIX } else { &self.prefix }
    }
}

/// Write `input` to `out_dir` as numbered chunk files and return their paths.
///
/// Only one chunk is held in memory at a time. An empty input writes nothing.
pub fn write_chunks(input: &Path, out_dir: &Path, options: &ChunkOptions) -> Result<Vec<PathBuf>> {
    debug!(input = %input.display(), out_dir = %out_dir.display(), ?options, "write_chunks: called");
    if input.as_os_str().is_empty() {
        return Err(RlmError::InvalidArgument("input path is required".to_string()));
    }
    if out_dir.as_os_str().is_empty() {
        return Err(RlmError::InvalidArgument("output directory is required".to_string()));
    }
    options.validate()?;

    fs::create_dir_all(out_dir).map_err(|e| RlmError::io(out_dir, e))?;

    let mut file = File::open(input).map_err(|e| RlmError::io(input, e))?;
    let size = file.metadata().map_err(|e| RlmError::io(input, e))?.len();

    let mut written = Vec::new();
    let mut buf = Vec::with_capacity(options.chunk_size);
    let mut offset = 0u64;

    for index in 0.. {
        buf.clear();
        let read = (&mut file)
            .take(options.chunk_size as u64)
            .read_to_end(&mut buf)
            .map_err(|e| RlmError::io(input, e))?;
        if read == 0 {
            break;
        }

        let chunk_path = out_dir.join(format!("{}_{:04}.txt", options.prefix(), index));
        fs::write(&chunk_path, &buf).map_err(|e| RlmError::io(&chunk_path, e))?;
        written.push(chunk_path);

        let end = offset + read as u64;
        if end >= size || read < options.chunk_size {
            break;
        }

        // Step back so the next chunk repeats the tail of this one
        offset = end - options.overlap as u64;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| RlmError::io(input, e))?;
    }

    info!(input = %input.display(), chunk_count = written.len(), "Chunking complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(content: &[u8]) -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("input.txt");
        fs::write(&input, content).unwrap();
        let out = temp.path().join("out");
        (temp, input, out)
    }

    fn options(chunk_size: usize, overlap: usize) -> ChunkOptions {
        ChunkOptions {
            chunk_size,
            overlap,
            ..Default::default()
        }
    }

    #[test]
    fn test_chunks_without_overlap() {
        let (_temp, input, out) = setup(b"abcdefghij");

        let paths = write_chunks(&input, &out, &options(4, 0)).unwrap();

        let contents: Vec<String> = paths.iter().map(|p| fs::read_to_string(p).unwrap()).collect();
        assert_eq!(contents, vec!["abcd", "efgh", "ij"]);
        assert_eq!(paths[0], out.join("chunk_0000.txt"));
        assert_eq!(paths[2], out.join("chunk_0002.txt"));
    }

    #[test]
    fn test_chunks_with_overlap() {
        let (_temp, input, out) = setup(b"abcdefghij");

        let paths = write_chunks(&input, &out, &options(4, 2)).unwrap();

        let contents: Vec<String> = paths.iter().map(|p| fs::read_to_string(p).unwrap()).collect();
        assert_eq!(contents, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let (_temp, input, out) = setup(b"abcdefgh");

        let paths = write_chunks(&input, &out, &options(4, 0)).unwrap();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let (_temp, input, out) = setup(b"");

        let paths = write_chunks(&input, &out, &options(4, 0)).unwrap();
        assert!(paths.is_empty());
        assert!(out.is_dir());
    }

    #[test]
    fn test_custom_prefix() {
        let (_temp, input, out) = setup(b"abc");
        let opts = ChunkOptions {
            chunk_size: 10,
            overlap: 0,
            prefix: "part".to_string(),
        };

        let paths = write_chunks(&input, &out, &opts).unwrap();
        assert_eq!(paths, vec![out.join("part_0000.txt")]);
    }

    #[test]
    fn test_invalid_options() {
        let (_temp, input, out) = setup(b"abc");

        assert!(matches!(
            write_chunks(&input, &out, &options(0, 0)),
            Err(RlmError::InvalidArgument(_))
        ));
        assert!(matches!(
            write_chunks(&input, &out, &options(4, 4)),
            Err(RlmError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_input() {
        let (temp, _input, out) = setup(b"");
        let err = write_chunks(&temp.path().join("absent.txt"), &out, &options(4, 0)).unwrap_err();
        assert!(matches!(err, RlmError::Io { .. }));
    }
}
