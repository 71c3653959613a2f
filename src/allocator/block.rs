//! Block extents within the simulated pool
//!
//! A block is a contiguous `[offset, offset + length)` range of pool bytes.
//! Blocks never have zero length while they sit in a list.

use serde::{Deserialize, Serialize};

/// A contiguous range of pool bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Starting offset within the pool
    pub offset: u64,
    /// Number of bytes covered
    pub length: u64,
}

impl Block {
    pub fn new(offset: u64, length: u64) -> Self {
        Block { offset, length }
    }

    /// One past the last byte of this block
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Check if two blocks share any byte
    pub fn overlaps(&self, other: &Block) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// Check if this block touches another end-to-start (in either order)
    pub fn is_adjacent(&self, other: &Block) -> bool {
        self.end() == other.offset || other.end() == self.offset
    }

    /// Join two adjacent blocks into one
    pub fn coalesce(&self, other: &Block) -> Option<Block> {
        if !self.is_adjacent(other) {
            return None;
        }

        let start = self.offset.min(other.offset);
        let end = self.end().max(other.end());

        Some(Block::new(start, end - start))
    }

    /// Split off the low `size` bytes
    ///
    /// Returns the carved block and the remainder, or `None` for the
    /// remainder on an exact fit. `size` must not exceed `length`.
    pub fn split(&self, size: u64) -> (Block, Option<Block>) {
        debug_assert!(size <= self.length);

        let head = Block::new(self.offset, size);
        let rest = (size < self.length).then(|| Block::new(self.offset + size, self.length - size));

        (head, rest)
    }
}
