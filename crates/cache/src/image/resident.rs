//! Resident block ordering and victim selection.
//!
//! Resident blocks are kept in ascending index order together with a scan
//! cursor that follows the most recent fault. The victim is chosen relative to
//! the cursor so that a forward scan evicts the rows it has already passed and
//! keeps the rows it is about to read:
//! 1. **Cursor at the front:** The highest resident block is evicted.
//! 2. **Otherwise:** The block just before the cursor is evicted and the cursor
//!    keeps pointing at the same block.
//!
//! After a fault the cursor is advanced across any run of contiguous resident
//! blocks that follows the new one, since a scan will reach those without faulting.

/// Ascending list of resident block indices with a scan cursor.
#[derive(Debug, Clone, Default)]
pub struct ResidentSet {
    order: Vec<usize>,
    cursor: usize,
}

impl ResidentSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            order: Vec::new(),
            cursor: 0,
        }
    }

    /// Number of resident blocks.
    pub const fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no block is resident.
    pub const fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resident blocks in ascending order.
    pub fn blocks(&self) -> &[usize] {
        &self.order
    }

    /// Block the cursor points at, if any block is resident.
    pub fn cursor_block(&self) -> Option<usize> {
        self.order.get(self.cursor).copied()
    }

    /// Records a newly faulted-in block and moves the cursor to it.
    pub fn insert(&mut self, block: usize) {
        let pos = self.order.partition_point(|&b| b < block);
        debug_assert!(self.order.get(pos) != Some(&block), "block {block} already resident");
        self.order.insert(pos, block);
        self.cursor = pos;
        while self.cursor + 1 < self.order.len()
            && self.order[self.cursor + 1] == self.order[self.cursor] + 1
        {
            self.cursor += 1;
        }
    }

    fn victim_position(&self) -> Option<usize> {
        match (self.cursor, self.order.len()) {
            (_, 0) => None,
            (0, len) => Some(len - 1),
            (cursor, _) => Some(cursor - 1),
        }
    }

    /// The block [`ResidentSet::pop_victim`] would remove.
    pub fn peek_victim(&self) -> Option<usize> {
        self.victim_position().map(|pos| self.order[pos])
    }

    /// Removes and returns the eviction victim.
    pub fn pop_victim(&mut self) -> Option<usize> {
        let pos = self.victim_position()?;
        let block = self.order.remove(pos);
        if pos < self.cursor {
            self.cursor -= 1;
        }
        Some(block)
    }

    /// Forgets every block and resets the cursor.
    pub fn clear(&mut self) {
        self.order.clear();
        self.cursor = 0;
    }
}
