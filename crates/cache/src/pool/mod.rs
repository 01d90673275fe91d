//! Fixed-size block pool.
//!
//! Every image cache draws its resident blocks from one pool owned by the
//! director. Chunks are requested from the system one at a time and recycled
//! through a free list, so the pool never holds more chunks than the director
//! has granted at its peak. Chunks are addressed by [`SlabHandle`]s rather
//! than pointers.

/// Bounds-checked storage for a single chunk.
pub mod buffer;

use tracing::trace;

use self::buffer::SlabBuffer;
use crate::common::{CacheError, Result};

/// Index of one chunk inside a [`BlockPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlabHandle(u32);

impl SlabHandle {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Allocator for chunks of exactly `block_size` bytes.
#[derive(Debug)]
pub struct BlockPool {
    block_size: usize,
    slabs: Vec<SlabBuffer>,
    free: Vec<SlabHandle>,
}

impl BlockPool {
    /// Creates an empty pool for chunks of `block_size` bytes.
    pub const fn new(block_size: usize) -> Self {
        Self {
            block_size,
            slabs: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Size of every chunk in bytes.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of chunks ever obtained from the system.
    pub const fn capacity(&self) -> usize {
        self.slabs.len()
    }

    /// Number of chunks currently handed out.
    pub const fn in_use(&self) -> usize {
        self.slabs.len() - self.free.len()
    }

    /// Hands out a chunk, reusing a released one when possible.
    ///
    /// A recycled chunk keeps its previous contents; callers overwrite it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OutOfMemory`] if a new chunk is needed and the
    /// system refuses it.
    pub fn allocate(&mut self) -> Result<SlabHandle> {
        if let Some(handle) = self.free.pop() {
            return Ok(handle);
        }
        let out_of_memory = CacheError::OutOfMemory {
            bytes: self.block_size,
        };
        let index = u32::try_from(self.slabs.len()).map_err(|_| out_of_memory)?;
        self.slabs.push(SlabBuffer::try_new(self.block_size)?);
        trace!(capacity = self.slabs.len(), "pool grew by one chunk");
        Ok(SlabHandle(index))
    }

    /// Returns a chunk to the free list.
    pub fn release(&mut self, handle: SlabHandle) {
        debug_assert!(handle.index() < self.slabs.len(), "foreign slab handle");
        debug_assert!(!self.free.contains(&handle), "slab released twice");
        self.free.push(handle);
    }

    /// Borrows the chunk behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not produced by this pool.
    pub fn slab(&self, handle: SlabHandle) -> &SlabBuffer {
        &self.slabs[handle.index()]
    }

    /// Mutably borrows the chunk behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not produced by this pool.
    pub fn slab_mut(&mut self, handle: SlabHandle) -> &mut SlabBuffer {
        &mut self.slabs[handle.index()]
    }
}
