//! Slab Buffer Implementation.
//!
//! This module provides a bounds-checked wrapper around one heap-allocated pool chunk.
//! The allocation is reserved fallibly, so a host that cannot supply another block
//! reports [`CacheError::OutOfMemory`] instead of aborting the process.

use std::ops::{Index, IndexMut};
use std::slice::SliceIndex;

use crate::common::{CacheError, Result};

/// A fixed-size byte buffer holding the rows of one cache block.
pub struct SlabBuffer {
    data: Box<[u8]>,
}

impl SlabBuffer {
    /// Allocates a zeroed buffer of the specified size.
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the buffer in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OutOfMemory`] if the allocator refuses the reservation.
    pub fn try_new(size: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| CacheError::OutOfMemory { bytes: size })?;
        data.resize(size, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    /// Returns the size of the buffer in bytes.
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no bytes.
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reads a slice of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the buffer size.
    pub fn read_slice(&self, offset: usize, len: usize) -> &[u8] {
        assert!(offset + len <= self.data.len(), "slab read out of bounds");
        &self.data[offset..offset + len]
    }

    /// Writes a slice into the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `offset + data.len()` exceeds the buffer size.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) {
        assert!(
            offset + data.len() <= self.data.len(),
            "slab write out of bounds"
        );
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Tiles `pattern` over the first `len` bytes of the buffer.
    ///
    /// `len` must be a multiple of the pattern length; an empty pattern zeroes the range.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the buffer size.
    pub fn fill_pattern(&mut self, len: usize, pattern: &[u8]) {
        assert!(len <= self.data.len(), "slab fill out of bounds");
        let target = &mut self.data[..len];
        if pattern.is_empty() {
            target.fill(0);
            return;
        }
        if let [byte] = pattern {
            target.fill(*byte);
            return;
        }
        for chunk in target.chunks_mut(pattern.len()) {
            chunk.copy_from_slice(&pattern[..chunk.len()]);
        }
    }
}

impl std::fmt::Debug for SlabBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlabBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}

impl<I: SliceIndex<[u8]>> Index<I> for SlabBuffer {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.data[index]
    }
}

impl<I: SliceIndex<[u8]>> IndexMut<I> for SlabBuffer {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.data[index]
    }
}
