//! Row-to-block geometry.
//!
//! A block holds a power-of-two number of consecutive rows, as many as fit in
//! one pool chunk. Row `r` lives in block `r >> log2(lines_per_block)`, and the
//! final block of an image may be short.

use crate::common::{CacheError, Result};

/// Derived layout of one image inside fixed-size blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: usize,
    height: usize,
    pixel_size: usize,
    row_bytes: usize,
    lines_per_block: usize,
    block_shift: u32,
    blocks_needed: usize,
}

impl Geometry {
    /// Computes the layout of a `width` x `height` image of `pixel_size`-byte pixels.
    ///
    /// An image with a zero dimension gets an empty layout that needs no blocks.
    ///
    /// # Arguments
    ///
    /// * `width` - Pixels per row.
    /// * `height` - Number of rows.
    /// * `pixel_size` - Bytes per pixel.
    /// * `block_size` - Bytes per pool chunk.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::RowTooWide`] if a single row does not fit in a block.
    pub fn new(width: usize, height: usize, pixel_size: usize, block_size: usize) -> Result<Self> {
        let Some(row_bytes) = width.checked_mul(pixel_size) else {
            return Err(CacheError::RowTooWide {
                row_bytes: usize::MAX,
                block_size,
            });
        };
        if row_bytes == 0 || height == 0 {
            return Ok(Self {
                width,
                height,
                row_bytes,
                ..Self::empty(pixel_size)
            });
        }

        let fit = block_size / row_bytes;
        if fit == 0 {
            return Err(CacheError::RowTooWide {
                row_bytes,
                block_size,
            });
        }
        let block_shift = fit.ilog2();
        let lines_per_block = 1 << block_shift;

        Ok(Self {
            width,
            height,
            pixel_size,
            row_bytes,
            lines_per_block,
            block_shift,
            blocks_needed: height.div_ceil(lines_per_block),
        })
    }

    /// A 0 x 0 layout.
    pub const fn empty(pixel_size: usize) -> Self {
        Self {
            width: 0,
            height: 0,
            pixel_size,
            row_bytes: 0,
            lines_per_block: 1,
            block_shift: 0,
            blocks_needed: 0,
        }
    }

    /// Pixels per row.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Bytes per pixel.
    pub const fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Bytes per row.
    pub const fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Rows per full block (a power of two).
    pub const fn lines_per_block(&self) -> usize {
        self.lines_per_block
    }

    /// Blocks required to cover every row.
    pub const fn blocks_needed(&self) -> usize {
        self.blocks_needed
    }

    /// True if the image has no pixels and never holds a block.
    pub const fn is_empty(&self) -> bool {
        self.blocks_needed == 0
    }

    /// Block containing `row`.
    pub const fn block_of(&self, row: usize) -> usize {
        row >> self.block_shift
    }

    /// First row stored in `block`.
    pub const fn first_row(&self, block: usize) -> usize {
        block << self.block_shift
    }

    /// Rows actually stored in `block`; only the final block can be short.
    pub fn rows_in_block(&self, block: usize) -> usize {
        let first = self.first_row(block);
        self.height.min(first + self.lines_per_block) - first
    }

    /// Bytes of row data in `block`.
    pub fn block_bytes(&self, block: usize) -> usize {
        self.rows_in_block(block) * self.row_bytes
    }

    /// Byte offset of `row` inside its block's chunk.
    pub const fn offset_in_block(&self, row: usize) -> usize {
        (row & (self.lines_per_block - 1)) * self.row_bytes
    }

    /// Byte offset of `block` inside the spill file.
    ///
    /// Computed in 64 bits so images past 4 GiB address correctly on 32-bit hosts.
    pub const fn spill_offset(&self, block: usize) -> u64 {
        self.first_row(block) as u64 * self.row_bytes as u64
    }
}
