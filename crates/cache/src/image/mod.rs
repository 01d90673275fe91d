//! Per-image cache state.
//!
//! An image cache maps rows onto fixed-size blocks and tracks the state of
//! every block. It provides:
//! 1. **Geometry:** Rows per block and the row-to-block mapping.
//! 2. **Block states:** `Absent`, `Resident` and `Swapped`, with dirty/backed flags on resident blocks.
//! 3. **Self eviction:** Cursor-relative victim choice and write-back to the spill file.
//!
//! The director owns every image cache and drives faults; this module never
//! touches the global budget.

/// Row-to-block layout.
pub mod geometry;
/// Resident block order and victim choice.
pub mod resident;
/// Unlinked temporary file for swapped blocks.
pub mod spill;

use std::path::PathBuf;

use tracing::trace;

pub use self::geometry::Geometry;
use self::resident::ResidentSet;
use self::spill::SpillFile;
use crate::common::{CacheId, Result};
use crate::pool::{BlockPool, SlabHandle};
use crate::stats::CacheStats;

/// State of one block of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Never written; reads come from the fill value.
    Absent,
    /// Held in a pool chunk.
    Resident {
        /// Chunk holding the rows.
        slab: SlabHandle,
        /// Modified since it was loaded.
        dirty: bool,
        /// The spill file holds a current copy.
        backed: bool,
    },
    /// Only present in the spill file.
    Swapped,
}

/// Where a resident row lives in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowLocation {
    pub(crate) slab: SlabHandle,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

/// One image's rows, block states and spill file.
#[derive(Debug)]
pub(crate) struct ImageCache {
    id: CacheId,
    geometry: Geometry,
    blocks: Vec<BlockState>,
    resident: ResidentSet,
    fill_value: Vec<u8>,
    spill: SpillFile,
    evictions: u64,
    last_victim: Option<usize>,
}

impl ImageCache {
    pub(crate) fn new(
        id: CacheId,
        geometry: Geometry,
        fill_value: Vec<u8>,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            id,
            geometry,
            blocks: vec![BlockState::Absent; geometry.blocks_needed()],
            resident: ResidentSet::new(),
            fill_value,
            spill: SpillFile::new(temp_dir),
            evictions: 0,
            last_victim: None,
        }
    }

    pub(crate) const fn id(&self) -> CacheId {
        self.id
    }

    /// Renames the cache after its contents moved to another id.
    pub(crate) const fn set_id(&mut self, id: CacheId) {
        self.id = id;
    }

    pub(crate) const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub(crate) fn fill_value(&self) -> &[u8] {
        &self.fill_value
    }

    pub(crate) fn set_fill_value(&mut self, fill_value: Vec<u8>) {
        self.fill_value = fill_value;
    }

    pub(crate) const fn resident_blocks(&self) -> usize {
        self.resident.len()
    }

    pub(crate) fn block_state(&self, block: usize) -> Option<BlockState> {
        self.blocks.get(block).copied()
    }

    /// Returns the location of `row` if its block is resident.
    ///
    /// A mutable lookup marks the block dirty.
    pub(crate) fn locate(&mut self, row: usize, mutable: bool) -> Option<RowLocation> {
        let block = self.geometry.block_of(row);
        match &mut self.blocks[block] {
            BlockState::Resident { slab, dirty, .. } => {
                *dirty |= mutable;
                Some(RowLocation {
                    slab: *slab,
                    offset: self.geometry.offset_in_block(row),
                    len: self.geometry.row_bytes(),
                })
            }
            BlockState::Absent | BlockState::Swapped => None,
        }
    }

    /// Brings `block` into a fresh chunk, from the spill file or the fill value.
    ///
    /// The caller must already hold the budget for one more block. On error no
    /// chunk is held and the block keeps its previous state.
    ///
    /// # Panics
    ///
    /// Panics if the block is already resident.
    pub(crate) fn load_block(
        &mut self,
        pool: &mut BlockPool,
        block: usize,
        mutable: bool,
    ) -> Result<()> {
        let state = self.blocks[block];
        assert!(
            !matches!(state, BlockState::Resident { .. }),
            "block {block} of cache {} is already resident",
            self.id
        );

        let slab = pool.allocate()?;
        let bytes = self.geometry.block_bytes(block);
        let backed = state == BlockState::Swapped;
        if backed {
            let offset = self.geometry.spill_offset(block);
            let target = &mut pool.slab_mut(slab)[..bytes];
            if let Err(e) = self.spill.read_at(self.id, offset, target) {
                pool.release(slab);
                return Err(e);
            }
        } else {
            pool.slab_mut(slab).fill_pattern(bytes, &self.fill_value);
        }

        self.blocks[block] = BlockState::Resident {
            slab,
            dirty: mutable,
            backed,
        };
        self.resident.insert(block);
        trace!(cache = %self.id, block, from_spill = backed, "block faulted in");
        Ok(())
    }

    /// Evicts one of this cache's blocks, writing it out first if dirty.
    ///
    /// Returns the evicted block, or `None` if nothing is resident. If the
    /// write-back fails the victim stays resident.
    pub(crate) fn evict_one(&mut self, pool: &mut BlockPool) -> Result<Option<usize>> {
        let Some(victim) = self.resident.peek_victim() else {
            return Ok(None);
        };
        let BlockState::Resident {
            slab,
            dirty,
            backed,
        } = self.blocks[victim]
        else {
            unreachable!("resident order lists non-resident block {victim}");
        };

        let next = if dirty {
            let bytes = self.geometry.block_bytes(victim);
            let offset = self.geometry.spill_offset(victim);
            self.spill
                .write_at(self.id, offset, pool.slab(slab).read_slice(0, bytes))?;
            BlockState::Swapped
        } else if backed {
            BlockState::Swapped
        } else {
            BlockState::Absent
        };

        let _ = self.resident.pop_victim();
        self.blocks[victim] = next;
        pool.release(slab);
        self.evictions += 1;
        self.last_victim = Some(victim);
        trace!(cache = %self.id, block = victim, dirty, "block evicted");
        Ok(Some(victim))
    }

    /// Returns every resident chunk to the pool without writing anything and
    /// drops the spill file.
    ///
    /// Returns the number of blocks released.
    pub(crate) fn release_all(&mut self, pool: &mut BlockPool) -> usize {
        let released = self.resident.len();
        for &block in self.resident.blocks() {
            if let BlockState::Resident { slab, .. } = self.blocks[block] {
                pool.release(slab);
            }
        }
        self.resident.clear();
        self.blocks.fill(BlockState::Absent);
        self.spill.reset();
        released
    }

    /// Releases everything and adopts a new layout and fill value.
    ///
    /// Returns the number of blocks released.
    pub(crate) fn reshape(
        &mut self,
        pool: &mut BlockPool,
        geometry: Geometry,
        fill_value: Vec<u8>,
    ) -> usize {
        let released = self.release_all(pool);
        self.geometry = geometry;
        self.blocks = vec![BlockState::Absent; geometry.blocks_needed()];
        self.fill_value = fill_value;
        self.evictions = 0;
        self.last_victim = None;
        released
    }

    /// Replaces the fill value and resets every pixel to it.
    ///
    /// Resident blocks are rewritten in place and become clean; swapped blocks
    /// fall back to `Absent`, so their spill data is never read again.
    pub(crate) fn refill(&mut self, pool: &mut BlockPool, fill_value: Vec<u8>) {
        self.fill_value = fill_value;
        for (block, state) in self.blocks.iter_mut().enumerate() {
            match state {
                BlockState::Resident { slab, dirty, backed } => {
                    *dirty = false;
                    *backed = false;
                    pool.slab_mut(*slab)
                        .fill_pattern(self.geometry.block_bytes(block), &self.fill_value);
                }
                BlockState::Swapped => *state = BlockState::Absent,
                BlockState::Absent => {}
            }
        }
    }

    pub(crate) fn stats(&self, misses: u64) -> CacheStats {
        CacheStats {
            id: self.id,
            width: self.geometry.width(),
            height: self.geometry.height(),
            pixel_size: self.geometry.pixel_size(),
            lines_per_block: self.geometry.lines_per_block(),
            blocks_needed: self.geometry.blocks_needed(),
            resident_blocks: self.resident.len(),
            misses,
            evictions: self.evictions,
            spill_writes: self.spill.writes(),
            spill_reads: self.spill.reads(),
            spill_bytes_written: self.spill.bytes_written(),
            spill_file_created: self.spill.is_created(),
            last_victim: self.last_victim,
        }
    }
}
