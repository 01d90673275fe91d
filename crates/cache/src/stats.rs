//! Cache statistics collection and reporting.
//!
//! This module defines the snapshots returned by the director. It provides:
//! 1. **Director totals:** Budget, available blocks, pool size and total misses.
//! 2. **Per-cache counters:** Geometry, residency, misses, evictions and spill traffic.
//!
//! Snapshots are plain values; they do not change after they are taken.

use std::fmt;

use crate::common::CacheId;

const RULE: &str = "==========================================================";
const THIN_RULE: &str = "----------------------------------------------------------";

/// Snapshot of the director's budget and pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorStats {
    /// Bytes per block.
    pub block_size_bytes: usize,
    /// Configured budget in bytes.
    pub managed_bytes: usize,
    /// Budget in blocks.
    pub managed_blocks: usize,
    /// Blocks not held by any cache.
    pub blocks_available: usize,
    /// Chunks the pool has obtained from the system.
    pub pool_capacity: usize,
    /// Chunks currently handed out by the pool.
    pub pool_in_use: usize,
    /// Misses across all caches since the last reset.
    pub total_misses: u64,
    /// Caches holding a block budget.
    pub registered_caches: usize,
}

impl DirectorStats {
    /// Prints the statistics table to stdout.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for DirectorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "ROW CACHE DIRECTOR")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "block_size               {} B", self.block_size_bytes)?;
        writeln!(f, "managed_bytes            {} B", self.managed_bytes)?;
        writeln!(f, "managed_blocks           {}", self.managed_blocks)?;
        writeln!(f, "blocks_available         {}", self.blocks_available)?;
        writeln!(f, "{THIN_RULE}")?;
        writeln!(f, "pool.capacity            {}", self.pool_capacity)?;
        writeln!(f, "pool.in_use              {}", self.pool_in_use)?;
        writeln!(f, "{THIN_RULE}")?;
        writeln!(f, "registered_caches        {}", self.registered_caches)?;
        writeln!(f, "total_misses             {}", self.total_misses)?;
        write!(f, "{RULE}")
    }
}

/// Snapshot of one image cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Cache identifier.
    pub id: CacheId,
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Bytes per pixel.
    pub pixel_size: usize,
    /// Rows per block.
    pub lines_per_block: usize,
    /// Blocks covering the image.
    pub blocks_needed: usize,
    /// Blocks currently in memory.
    pub resident_blocks: usize,
    /// Faults since registration or the last reset.
    pub misses: u64,
    /// Blocks evicted since the last resize.
    pub evictions: u64,
    /// Dirty blocks written to the spill file.
    pub spill_writes: u64,
    /// Blocks read back from the spill file.
    pub spill_reads: u64,
    /// Bytes written to the spill file.
    pub spill_bytes_written: u64,
    /// Whether a spill file exists.
    pub spill_file_created: bool,
    /// Most recently evicted block.
    pub last_victim: Option<usize>,
}

impl CacheStats {
    /// Prints the statistics table to stdout.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IMAGE CACHE {}", self.id)?;
        writeln!(
            f,
            "  geometry               {} x {} x {} B",
            self.width, self.height, self.pixel_size
        )?;
        writeln!(f, "  lines_per_block        {}", self.lines_per_block)?;
        writeln!(
            f,
            "  resident               {} / {} blocks",
            self.resident_blocks, self.blocks_needed
        )?;
        writeln!(f, "  misses                 {}", self.misses)?;
        writeln!(f, "  evictions              {}", self.evictions)?;
        if self.spill_file_created {
            writeln!(
                f,
                "  spill.writes           {} ({} B)",
                self.spill_writes, self.spill_bytes_written
            )?;
            writeln!(f, "  spill.reads            {}", self.spill_reads)?;
        } else {
            writeln!(f, "  spill                  none")?;
        }
        write!(f, "{THIN_RULE}")
    }
}
