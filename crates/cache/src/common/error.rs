//! Error definitions.
//!
//! Two classes of failure are fatal for the operation that triggered them:
//! 1. **Budget exhaustion:** A cache holding no blocks was denied one and no other
//!    cache could donate. This is a workload/configuration problem.
//! 2. **Spill I/O:** The spill file could not be created, written, or read back, so
//!    the cache can no longer vouch for its pixel data.
//!
//! The remaining variants report configuration mistakes and stale identifiers.
//! Cache misses and evictions are never errors.

use std::fmt;
use std::io;

use thiserror::Error;

use super::id::CacheId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

/// The spill file operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillOp {
    /// Creating the unlinked temporary file.
    Create,
    /// Positioning the file cursor.
    Seek,
    /// Reading a swapped block back in.
    Read,
    /// Writing a dirty block out.
    Write,
}

impl fmt::Display for SpillOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Seek => "seek",
            Self::Read => "read",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Errors reported by the director and image caches.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache holds no blocks and the director could not free one for it.
    #[error(
        "cache {cache} is out of memory blocks: it holds none and none could be freed; \
         increase the managed memory or decrease the block size"
    )]
    Thrash {
        /// The cache that could not make progress.
        cache: CacheId,
    },

    /// A spill file operation failed.
    #[error("spill file {op} failed for cache {cache}")]
    SpillIo {
        /// The cache that owns the spill file.
        cache: CacheId,
        /// The failing operation.
        op: SpillOp,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The system allocator refused a block.
    #[error("system allocator refused a {bytes}-byte cache block")]
    OutOfMemory {
        /// Size of the block that could not be allocated.
        bytes: usize,
    },

    /// Configuration was changed while caches were registered.
    #[error("cache configuration cannot change while {registered} cache(s) are registered")]
    ConfigLocked {
        /// Number of caches registered at the time of the attempt.
        registered: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse cache configuration")]
    ConfigParse(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("failed to read cache configuration file")]
    ConfigRead(#[source] io::Error),

    /// A single row is larger than a block.
    #[error(
        "an image row of {row_bytes} bytes does not fit in a {block_size}-byte block; \
         increase the block size"
    )]
    RowTooWide {
        /// Bytes in one row.
        row_bytes: usize,
        /// Configured block size.
        block_size: usize,
    },

    /// A fill value does not match the cache's pixel size.
    #[error("fill value is {actual} bytes but the cache stores {expected}-byte pixels")]
    FillSize {
        /// Pixel size of the cache.
        expected: usize,
        /// Length of the supplied fill value.
        actual: usize,
    },

    /// The identifier does not name a live cache.
    #[error("no cache with id {0}")]
    UnknownCache(CacheId),
}

impl CacheError {
    /// Returns true for failures after which the triggering operation cannot be retried.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Thrash { .. } | Self::SpillIo { .. } | Self::OutOfMemory { .. }
        )
    }

    pub(crate) const fn spill(cache: CacheId, op: SpillOp, source: io::Error) -> Self {
        Self::SpillIo { cache, op, source }
    }
}
