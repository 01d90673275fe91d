//! Disk-backed, budget-limited image row cache.
//!
//! This crate lets an image processing pipeline treat images far larger than
//! physical memory as ordinary arrays of pixel rows. It provides:
//! 1. **Director:** The context object that owns the global block budget, the block pool,
//!    and every open image cache, and decides which cache gives up a block under pressure.
//! 2. **Image caches:** Per-image row-to-block mapping, fault handling, scan-aware
//!    self eviction, and a lazily created, unlinked spill file.
//! 3. **Pool:** A fixed-size slab allocator that grows one block at a time.
//! 4. **Configuration and statistics:** Serde-backed configuration and miss/eviction counters.
//!
//! ```
//! use rowswap_core::{CacheConfig, Director};
//!
//! let config = CacheConfig::default()
//!     .with_block_size_kb(4)
//!     .with_managed_mb(1);
//! let mut director = Director::new(config).unwrap();
//! let id = director.create_cache_with(640, 480, 0u8).unwrap();
//!
//! let mut image = director.cache(id).unwrap();
//! image.get_row_mut(10).unwrap()[3] = 200;
//! assert_eq!(image.get_row(10).unwrap()[3], 200);
//! ```

/// Common types (errors, cache identifiers, pixel encoding).
pub mod common;
/// Cache configuration (defaults, builders, JSON loading, validation).
pub mod config;
/// The director: global budget, cache registry, and row access.
pub mod director;
/// Per-image cache state (geometry, residency, spill file).
pub mod image;
/// Fixed-size block pool.
pub mod pool;
/// Director and per-cache statistics.
pub mod stats;

/// Error type and result alias used across the crate.
pub use crate::common::{CacheError, CacheId, Pixel, Result};
/// Root configuration type; use `CacheConfig::default()` or deserialize from JSON.
pub use crate::config::CacheConfig;
/// Budget owner and arbiter for all image caches.
pub use crate::director::{CacheHandle, Director};
/// Statistics snapshots.
pub use crate::stats::{CacheStats, DirectorStats};
