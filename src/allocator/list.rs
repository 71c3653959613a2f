//! Head-insertion block list
//!
//! Both the free list and the allocated list use this type. New entries are
//! always pushed at the head, so traversal sees the most recently inserted
//! block first. First-fit results depend on this order.

use crate::allocator::block::Block;
use std::collections::VecDeque;

/// An insertion-ordered collection of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    blocks: VecDeque<Block>,
}

impl BlockList {
    pub fn new() -> Self {
        BlockList {
            blocks: VecDeque::new(),
        }
    }

    /// Insert a block at the head of the list
    pub fn push_front(&mut self, block: Block) {
        debug_assert!(block.length > 0, "zero-length block inserted");
        self.blocks.push_front(block);
    }

    /// Remove the block at `index`, counting from the head
    pub fn remove(&mut self, index: usize) -> Option<Block> {
        self.blocks.remove(index)
    }

    /// Replace the block at `index` without changing its list position
    pub fn set(&mut self, index: usize, block: Block) {
        debug_assert!(block.length > 0, "zero-length block stored");
        self.blocks[index] = block;
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Find the block starting exactly at `offset`
    pub fn position_of(&self, offset: u64) -> Option<usize> {
        self.blocks.iter().position(|block| block.offset == offset)
    }

    /// Traverse from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of all block lengths
    pub fn total_length(&self) -> u64 {
        self.blocks.iter().map(|block| block.length).sum()
    }

    /// Copy of the blocks in ascending offset order
    ///
    /// The list itself keeps its insertion order.
    pub fn sorted_by_offset(&self) -> Vec<Block> {
        let mut sorted: Vec<Block> = self.blocks.iter().copied().collect();
        sorted.sort_unstable_by_key(|block| block.offset);
        sorted
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
