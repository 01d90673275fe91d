//! Spill file for evicted dirty blocks.
//!
//! Each image cache owns at most one spill file, created on the first dirty
//! eviction. The file is unlinked at creation, so it disappears with the
//! handle even if the process dies. Blocks are stored raw at
//! `first_row * row_bytes`; the file is sparse until every block is written.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::common::{CacheError, CacheId, Result, SpillOp};

/// Lazily created, unlinked temporary file backing one image cache.
#[derive(Debug, Default)]
pub struct SpillFile {
    dir: Option<PathBuf>,
    file: Option<File>,
    writes: u64,
    reads: u64,
    bytes_written: u64,
}

impl SpillFile {
    /// Creates a handle that will place its file in `dir` (or the system temp directory).
    pub const fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            file: None,
            writes: 0,
            reads: 0,
            bytes_written: 0,
        }
    }

    /// True once the backing file exists.
    pub const fn is_created(&self) -> bool {
        self.file.is_some()
    }

    /// Number of block writes.
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Number of block reads.
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    /// Total bytes written.
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn open(&mut self, cache: CacheId) -> Result<&mut File> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let file = match &self.dir {
                    Some(dir) => tempfile::tempfile_in(dir),
                    None => tempfile::tempfile(),
                }
                .map_err(|e| CacheError::spill(cache, SpillOp::Create, e))?;
                debug!(%cache, dir = ?self.dir, "spill file created");
                file
            }
        };
        Ok(self.file.insert(file))
    }

    /// Writes one block's bytes at `offset`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::SpillIo`] if the file cannot be created, positioned or written.
    pub fn write_at(&mut self, cache: CacheId, offset: u64, data: &[u8]) -> Result<()> {
        let file = self.open(cache)?;
        let _ = file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| CacheError::spill(cache, SpillOp::Seek, e))?;
        file.write_all(data)
            .map_err(|e| CacheError::spill(cache, SpillOp::Write, e))?;
        self.writes += 1;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Reads one block's bytes from `offset` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::SpillIo`] if the file is missing, cannot be positioned,
    /// or ends before `buf` is filled.
    pub fn read_at(&mut self, cache: CacheId, offset: u64, buf: &mut [u8]) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(CacheError::spill(
                cache,
                SpillOp::Read,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no spill file for swapped block"),
            ));
        };
        let _ = file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| CacheError::spill(cache, SpillOp::Seek, e))?;
        file.read_exact(buf)
            .map_err(|e| CacheError::spill(cache, SpillOp::Read, e))?;
        self.reads += 1;
        Ok(())
    }

    /// Closes the backing file and clears the counters.
    ///
    /// The file was unlinked at creation, so the OS reclaims its space here.
    pub fn reset(&mut self) {
        if self.file.take().is_some() {
            debug!(bytes_written = self.bytes_written, "spill file dropped");
        }
        self.writes = 0;
        self.reads = 0;
        self.bytes_written = 0;
    }
}
