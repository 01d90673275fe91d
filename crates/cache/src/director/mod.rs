//! Cache director.
//!
//! The director is the single owner of the memory budget. It provides:
//! 1. **Budget:** A fixed number of blocks, derived from the configured budget and
//!    block size, shared by every image cache it owns.
//! 2. **Arbitration:** On a miss the faulting cache is moved to the back of the
//!    registry; if no block is free, the cache at the front that still holds
//!    blocks evicts one of its own choosing and the quota moves to the asker.
//! 3. **Ownership:** All image caches live here, keyed by [`CacheId`], so a donor
//!    eviction is an ordinary method call on an owned value.
//! 4. **Row access:** Read and write access to rows, faulting blocks in as needed.
//!
//! At every quiescent point `blocks_available + Σ resident blocks == managed_blocks`,
//! which [`Director::is_balanced`] checks.

/// Borrowed single-image view.
pub mod handle;
/// Fault-recency order of registered caches.
pub mod registry;

use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

pub use self::handle::CacheHandle;
use self::registry::Registry;
use crate::common::{CacheError, CacheId, Pixel, Result};
use crate::config::CacheConfig;
use crate::image::{BlockState, Geometry, ImageCache, RowLocation};
use crate::pool::BlockPool;
use crate::stats::{CacheStats, DirectorStats};

/// Owner of the block budget, the block pool and every image cache.
///
/// Access takes `&mut self`; callers that need to share a director across
/// threads wrap it in a mutex.
#[derive(Debug)]
pub struct Director {
    config: CacheConfig,
    managed_blocks: usize,
    blocks_available: usize,
    pool: BlockPool,
    registry: Registry,
    caches: HashMap<CacheId, ImageCache>,
    next_id: u64,
}

impl Director {
    /// Creates a director with the budget described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if the configuration is unusable.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let managed_blocks = config.managed_blocks();
        info!(
            block_size = config.block_size_bytes,
            managed_bytes = config.managed_bytes,
            managed_blocks,
            "cache director created"
        );
        Ok(Self {
            pool: BlockPool::new(config.block_size_bytes),
            managed_blocks,
            blocks_available: managed_blocks,
            registry: Registry::new(),
            caches: HashMap::new(),
            next_id: 0,
            config,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Bytes per block.
    pub const fn block_size(&self) -> usize {
        self.config.block_size_bytes
    }

    /// Total budget in blocks.
    pub const fn managed_blocks(&self) -> usize {
        self.managed_blocks
    }

    /// Blocks not held by any cache.
    pub const fn blocks_available(&self) -> usize {
        self.blocks_available
    }

    /// Number of caches holding budget (non-empty caches).
    pub fn registered_caches(&self) -> usize {
        self.registry.len()
    }

    /// Number of live caches, empty ones included.
    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }

    // ══════════════════════════════════════════════════════════
    // Configuration
    // ══════════════════════════════════════════════════════════

    /// Changes the block size.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigLocked`] while any cache is registered and
    /// [`CacheError::InvalidConfig`] for a zero size.
    pub fn set_block_size(&mut self, bytes: usize) -> Result<()> {
        let config = CacheConfig {
            block_size_bytes: bytes,
            ..self.config.clone()
        };
        self.reconfigure(config)
    }

    /// Changes the memory budget.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigLocked`] while any cache is registered and
    /// [`CacheError::InvalidConfig`] for a zero size.
    pub fn set_allocation(&mut self, bytes: usize) -> Result<()> {
        let config = CacheConfig {
            managed_bytes: bytes,
            ..self.config.clone()
        };
        self.reconfigure(config)
    }

    fn reconfigure(&mut self, config: CacheConfig) -> Result<()> {
        if !self.registry.is_empty() {
            return Err(CacheError::ConfigLocked {
                registered: self.registry.len(),
            });
        }
        config.validate()?;
        self.managed_blocks = config.managed_blocks();
        self.blocks_available = self.managed_blocks;
        self.pool = BlockPool::new(config.block_size_bytes);
        info!(
            block_size = config.block_size_bytes,
            managed_bytes = config.managed_bytes,
            managed_blocks = self.managed_blocks,
            "cache director reconfigured"
        );
        self.config = config;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Budget arbitration
    // ══════════════════════════════════════════════════════════

    /// Takes one block of quota, from the free count or from a donor.
    fn take_block(&mut self) -> Result<bool> {
        if self.blocks_available > 0 {
            self.blocks_available -= 1;
            return Ok(true);
        }
        self.free_one_block()
    }

    /// Appends `id` to the registry and grants it its first block.
    ///
    /// Returns false if no block could be found.
    fn register(&mut self, id: CacheId) -> Result<bool> {
        let granted = self.take_block()?;
        self.registry.register(id);
        Ok(granted)
    }

    /// Removes `id` from the registry and returns its resident blocks to the budget.
    fn unregister(&mut self, id: CacheId) {
        let _ = self.registry.unregister(id);
        if let Some(cache) = self.caches.get_mut(&id) {
            let released = cache.release_all(&mut self.pool);
            self.blocks_available += released;
        }
    }

    /// Records a miss by `id` and tries to grant it one block.
    ///
    /// The asker moves to the back of the registry before a donor is sought,
    /// so it only donates to itself when no other cache holds a block.
    pub(crate) fn report_miss(&mut self, id: CacheId) -> Result<bool> {
        self.registry.record_miss(id);
        self.take_block()
    }

    /// Asks the least recently faulting cache that holds a block to evict one.
    ///
    /// The quota of the evicted block is handed to the caller, not added to
    /// `blocks_available`. The donor keeps its registry position.
    pub(crate) fn free_one_block(&mut self) -> Result<bool> {
        let donor = self.registry.iter().find(|id| {
            self.caches
                .get(id)
                .is_some_and(|cache| cache.resident_blocks() > 0)
        });
        let Some(cache) = donor.and_then(|id| self.caches.get_mut(&id)) else {
            return Ok(false);
        };
        match cache.evict_one(&mut self.pool) {
            Ok(victim) => {
                trace!(donor = %cache.id(), ?victim, "donor released a block");
                Ok(victim.is_some())
            }
            Err(e) => {
                warn!(donor = %cache.id(), error = %e, "donor eviction failed");
                Err(e)
            }
        }
    }

    /// Registers a non-empty cache and fills its first block.
    ///
    /// On failure the cache is left unregistered and holds no blocks.
    fn activate(&mut self, id: CacheId) -> Result<()> {
        let cache = self.caches.get(&id).ok_or(CacheError::UnknownCache(id))?;
        if cache.geometry().is_empty() {
            return Ok(());
        }
        if !self.register(id)? {
            let _ = self.registry.unregister(id);
            warn!(cache = %id, "no block available for a new cache");
            return Err(CacheError::Thrash { cache: id });
        }
        let loaded = match self.caches.get_mut(&id) {
            Some(cache) => cache.load_block(&mut self.pool, 0, false),
            None => Err(CacheError::UnknownCache(id)),
        };
        if let Err(e) = loaded {
            self.blocks_available += 1;
            let _ = self.registry.unregister(id);
            warn!(cache = %id, error = %e, "failed to fill first block");
            return Err(e);
        }
        Ok(())
    }

    /// Brings `block` of `id` into memory after a miss.
    ///
    /// The asker sits at the back of the registry when a donor is sought, so it
    /// evicts one of its own blocks only when no other cache holds one. A
    /// refusal therefore means no cache holds a block at all.
    fn fault(&mut self, id: CacheId, block: usize, mutable: bool) -> Result<()> {
        trace!(cache = %id, block, mutable, "miss");
        if !self.report_miss(id)? {
            warn!(cache = %id, "cache holds no blocks and none could be freed");
            return Err(CacheError::Thrash { cache: id });
        }
        let cache = self
            .caches
            .get_mut(&id)
            .ok_or(CacheError::UnknownCache(id))?;
        if let Err(e) = cache.load_block(&mut self.pool, block, mutable) {
            self.blocks_available += 1;
            warn!(cache = %id, block, error = %e, "fault failed");
            return Err(e);
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Cache lifecycle
    // ══════════════════════════════════════════════════════════

    /// Creates an image cache whose pixels start as `fill`.
    ///
    /// The pixel size is `fill.len()` and stays fixed for the life of the cache.
    /// An image with a zero dimension is created empty and holds no budget.
    ///
    /// # Errors
    ///
    /// * [`CacheError::InvalidConfig`] if `fill` is empty.
    /// * [`CacheError::RowTooWide`] if one row exceeds the block size.
    /// * [`CacheError::Thrash`], [`CacheError::SpillIo`] or [`CacheError::OutOfMemory`]
    ///   if the first block cannot be obtained.
    pub fn create_cache(&mut self, width: usize, height: usize, fill: &[u8]) -> Result<CacheId> {
        if fill.is_empty() {
            return Err(CacheError::InvalidConfig(
                "pixel size must be at least one byte".to_owned(),
            ));
        }
        let geometry = Geometry::new(width, height, fill.len(), self.block_size())?;
        let id = CacheId(self.next_id);
        self.next_id += 1;

        let cache = ImageCache::new(id, geometry, fill.to_vec(), self.config.temp_dir.clone());
        let _ = self.caches.insert(id, cache);
        if let Err(e) = self.activate(id) {
            let _ = self.caches.remove(&id);
            return Err(e);
        }
        debug!(
            cache = %id,
            width,
            height,
            pixel_size = fill.len(),
            lines_per_block = geometry.lines_per_block(),
            blocks_needed = geometry.blocks_needed(),
            "image cache created"
        );
        debug_assert!(self.is_balanced());
        Ok(id)
    }

    /// Creates an image cache of typed pixels.
    ///
    /// # Errors
    ///
    /// Same as [`Director::create_cache`].
    pub fn create_cache_with<P: Pixel>(
        &mut self,
        width: usize,
        height: usize,
        fill: P,
    ) -> Result<CacheId> {
        self.create_cache(width, height, &fill.to_bytes())
    }

    /// Destroys a cache, returning its blocks to the budget without writing them.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if `id` is not live.
    pub fn destroy_cache(&mut self, id: CacheId) -> Result<()> {
        if !self.caches.contains_key(&id) {
            return Err(CacheError::UnknownCache(id));
        }
        self.unregister(id);
        let _ = self.caches.remove(&id);
        debug!(cache = %id, "image cache destroyed");
        debug_assert!(self.is_balanced());
        Ok(())
    }

    /// Borrows a single-image view of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if `id` is not live.
    pub fn cache(&mut self, id: CacheId) -> Result<CacheHandle<'_>> {
        if !self.caches.contains_key(&id) {
            return Err(CacheError::UnknownCache(id));
        }
        Ok(CacheHandle::new(self, id))
    }

    /// Layout of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if `id` is not live.
    pub fn geometry(&self, id: CacheId) -> Result<Geometry> {
        self.caches
            .get(&id)
            .map(|cache| *cache.geometry())
            .ok_or(CacheError::UnknownCache(id))
    }

    /// State of one block of `id`, or `None` past the last block.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if `id` is not live.
    pub fn block_state(&self, id: CacheId, block: usize) -> Result<Option<BlockState>> {
        self.caches
            .get(&id)
            .map(|cache| cache.block_state(block))
            .ok_or(CacheError::UnknownCache(id))
    }

    // ══════════════════════════════════════════════════════════
    // Row access
    // ══════════════════════════════════════════════════════════

    fn locate(&mut self, id: CacheId, row: usize, mutable: bool) -> Result<RowLocation> {
        let cache = self
            .caches
            .get_mut(&id)
            .ok_or(CacheError::UnknownCache(id))?;
        let geometry = *cache.geometry();
        assert!(!geometry.is_empty(), "cache {id} is empty");
        assert!(
            row < geometry.height(),
            "row {row} out of range for cache {id} with {} rows",
            geometry.height()
        );
        if let Some(location) = cache.locate(row, mutable) {
            return Ok(location);
        }

        let block = geometry.block_of(row);
        self.fault(id, block, mutable)?;
        debug_assert!(self.is_balanced());
        match self.caches.get_mut(&id).and_then(|c| c.locate(row, mutable)) {
            Some(location) => Ok(location),
            None => unreachable!("block {block} of cache {id} is not resident after a fault"),
        }
    }

    /// Borrows row `row` of `id` for reading, faulting its block in if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] for a stale id, or a fatal error if
    /// the block cannot be brought in.
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty or `row` is not below its height.
    pub fn row(&mut self, id: CacheId, row: usize) -> Result<&[u8]> {
        let loc = self.locate(id, row, false)?;
        Ok(self.pool.slab(loc.slab).read_slice(loc.offset, loc.len))
    }

    /// Borrows row `row` of `id` for writing and marks its block dirty.
    ///
    /// # Errors
    ///
    /// Same as [`Director::row`].
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty or `row` is not below its height.
    pub fn row_mut(&mut self, id: CacheId, row: usize) -> Result<&mut [u8]> {
        let loc = self.locate(id, row, true)?;
        Ok(&mut self.pool.slab_mut(loc.slab)[loc.offset..loc.offset + loc.len])
    }

    // ══════════════════════════════════════════════════════════
    // Whole-image operations
    // ══════════════════════════════════════════════════════════

    fn check_fill(&self, id: CacheId, fill: &[u8]) -> Result<()> {
        let expected = self.geometry(id)?.pixel_size();
        if fill.len() == expected {
            Ok(())
        } else {
            Err(CacheError::FillSize {
                expected,
                actual: fill.len(),
            })
        }
    }

    /// Resizes `id`, discarding its contents, and fills it with `fill`.
    ///
    /// All resident blocks are released without being written and the spill
    /// file is dropped. The miss counter starts again from zero.
    ///
    /// # Errors
    ///
    /// * [`CacheError::FillSize`] if `fill` does not match the pixel size.
    /// * [`CacheError::RowTooWide`] if a new row exceeds the block size; the cache is unchanged.
    /// * A fatal error if the first block cannot be obtained; the cache is left empty.
    pub fn resize(&mut self, id: CacheId, width: usize, height: usize, fill: &[u8]) -> Result<()> {
        self.check_fill(id, fill)?;
        self.reshape(id, width, height, fill.to_vec())
    }

    fn reshape(&mut self, id: CacheId, width: usize, height: usize, fill: Vec<u8>) -> Result<()> {
        let geometry = Geometry::new(width, height, fill.len(), self.block_size())?;
        let _ = self.registry.unregister(id);
        let cache = self
            .caches
            .get_mut(&id)
            .ok_or(CacheError::UnknownCache(id))?;
        self.blocks_available += cache.reshape(&mut self.pool, geometry, fill);
        debug!(
            cache = %id,
            width,
            height,
            blocks_needed = geometry.blocks_needed(),
            "image cache resized"
        );

        if let Err(e) = self.activate(id) {
            if let Some(cache) = self.caches.get_mut(&id) {
                let fill = cache.fill_value().to_vec();
                let empty = Geometry::empty(fill.len());
                let _ = cache.reshape(&mut self.pool, empty, fill);
            }
            return Err(e);
        }
        debug_assert!(self.is_balanced());
        Ok(())
    }

    /// Sets every pixel of `id` to `fill` and forgets any swapped-out data.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] or [`CacheError::FillSize`].
    pub fn fill(&mut self, id: CacheId, fill: &[u8]) -> Result<()> {
        self.check_fill(id, fill)?;
        let cache = self
            .caches
            .get_mut(&id)
            .ok_or(CacheError::UnknownCache(id))?;
        cache.refill(&mut self.pool, fill.to_vec());
        debug!(cache = %id, "image cache refilled");
        Ok(())
    }

    fn copy_rows(&mut self, src: CacheId, dst: CacheId) -> Result<()> {
        let geometry = self.geometry(src)?;
        if geometry.is_empty() {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(geometry.row_bytes());
        for row in 0..geometry.height() {
            buf.clear();
            buf.extend_from_slice(self.row(src, row)?);
            self.row_mut(dst, row)?.copy_from_slice(&buf);
        }
        Ok(())
    }

    /// Creates a new cache with the same layout, fill value and pixels as `id`.
    ///
    /// # Errors
    ///
    /// Any error from [`Director::create_cache`] or from faulting rows in.
    pub fn duplicate(&mut self, id: CacheId) -> Result<CacheId> {
        let geometry = self.geometry(id)?;
        let fill = self
            .caches
            .get(&id)
            .map(|cache| cache.fill_value().to_vec())
            .ok_or(CacheError::UnknownCache(id))?;
        let copy = self.create_cache(geometry.width(), geometry.height(), &fill)?;
        if let Err(e) = self.copy_rows(id, copy) {
            let _ = self.destroy_cache(copy);
            return Err(e);
        }
        debug!(source = %id, cache = %copy, "image cache duplicated");
        Ok(copy)
    }

    /// Makes `dst` a copy of `src`, resizing it first if the layouts differ.
    ///
    /// # Errors
    ///
    /// [`CacheError::UnknownCache`] for a stale id, or any error from resizing
    /// `dst` or faulting rows in.
    pub fn copy_image(&mut self, src: CacheId, dst: CacheId) -> Result<()> {
        let from = self.geometry(src)?;
        let to = self.geometry(dst)?;
        if src == dst {
            return Ok(());
        }
        let fill = self
            .caches
            .get(&src)
            .map(|cache| cache.fill_value().to_vec())
            .ok_or(CacheError::UnknownCache(src))?;
        let same_shape = (from.width(), from.height(), from.pixel_size())
            == (to.width(), to.height(), to.pixel_size());
        if same_shape {
            if let Some(cache) = self.caches.get_mut(&dst) {
                cache.set_fill_value(fill);
            }
        } else {
            self.reshape(dst, from.width(), from.height(), fill)?;
        }
        self.copy_rows(src, dst)
    }

    /// Exchanges the contents of two caches; the ids stay where they are.
    ///
    /// Blocks, spill files, registry positions and miss counters move with the contents.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if either id is not live.
    pub fn swap_caches(&mut self, a: CacheId, b: CacheId) -> Result<()> {
        if a == b {
            return self.geometry(a).map(|_| ());
        }
        let Some(mut first) = self.caches.remove(&a) else {
            return Err(CacheError::UnknownCache(a));
        };
        let Some(mut second) = self.caches.remove(&b) else {
            let _ = self.caches.insert(a, first);
            return Err(CacheError::UnknownCache(b));
        };
        first.set_id(b);
        second.set_id(a);
        let _ = self.caches.insert(a, second);
        let _ = self.caches.insert(b, first);
        self.registry.swap(a, b);
        debug!(%a, %b, "image caches swapped");
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Statistics
    // ══════════════════════════════════════════════════════════

    /// Snapshot of the budget and pool.
    pub fn stats(&self) -> DirectorStats {
        DirectorStats {
            block_size_bytes: self.config.block_size_bytes,
            managed_bytes: self.config.managed_bytes,
            managed_blocks: self.managed_blocks,
            blocks_available: self.blocks_available,
            pool_capacity: self.pool.capacity(),
            pool_in_use: self.pool.in_use(),
            total_misses: self.registry.total_misses(),
            registered_caches: self.registry.len(),
        }
    }

    /// Snapshot of one cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if `id` is not live.
    pub fn cache_stats(&self, id: CacheId) -> Result<CacheStats> {
        self.caches
            .get(&id)
            .map(|cache| cache.stats(self.registry.misses(id)))
            .ok_or(CacheError::UnknownCache(id))
    }

    /// Snapshots of every live cache, ordered by id.
    pub fn all_cache_stats(&self) -> Vec<CacheStats> {
        let mut stats: Vec<_> = self
            .caches
            .values()
            .map(|cache| cache.stats(self.registry.misses(cache.id())))
            .collect();
        stats.sort_by_key(|s| s.id);
        stats
    }

    /// Zeroes the total and every per-cache miss counter.
    pub fn reset_cache_misses(&mut self) {
        self.registry.reset_misses();
    }

    /// True if free blocks plus resident blocks equal the budget and the pool
    /// has handed out exactly the resident blocks.
    pub fn is_balanced(&self) -> bool {
        let resident: usize = self.caches.values().map(ImageCache::resident_blocks).sum();
        self.blocks_available + resident == self.managed_blocks && self.pool.in_use() == resident
    }

    /// Destroys every cache and returns the final statistics.
    pub fn shutdown(mut self) -> DirectorStats {
        let ids: Vec<_> = self.caches.keys().copied().collect();
        for id in ids {
            self.unregister(id);
        }
        self.caches.clear();
        let stats = self.stats();
        info!(
            total_misses = stats.total_misses,
            pool_capacity = stats.pool_capacity,
            "cache director shut down"
        );
        stats
    }
}
