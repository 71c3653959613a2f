//! Allocator engine over a simulated pool
//!
//! The engine owns the pool capacity, the free list, the allocated list and
//! the placement strategy. Addresses are plain offsets; no real memory is
//! reserved.
//!
//! Freed blocks go back on the free list as they are. Adjacent free blocks
//! are never merged in the list itself, only in the read-only views
//! produced by [`Engine::stats`] and [`Engine::layout`].

use crate::allocator::block::Block;
use crate::allocator::list::BlockList;
use crate::allocator::strategy::Strategy;
use crate::allocator::BlockAllocator;
use crate::error::{PoolError, Result};
use crate::layout::Layout;
use crate::stats::PoolStats;
use tracing::{debug, info, warn};

/// A live pool with its block bookkeeping
#[derive(Debug, Clone)]
pub struct Engine {
    /// Total simulated size in bytes
    capacity: u64,

    /// Placement policy, fixed at creation
    strategy: Strategy,

    /// Unallocated extents, most recently inserted first
    free: BlockList,

    /// Live allocations, keyed by their starting offset
    allocated: BlockList,
}

impl Engine {
    /// Create a pool of `capacity` bytes
    ///
    /// The free list starts with a single block covering the whole pool.
    pub fn new(capacity: u64, strategy: Strategy) -> Result<Self> {
        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }

        let mut free = BlockList::new();
        free.push_front(Block::new(0, capacity));

        info!("Pool initialized with {} bytes using {}", capacity, strategy);

        Ok(Engine {
            capacity,
            strategy,
            free,
            allocated: BlockList::new(),
        })
    }

    /// Allocate `size` bytes and return the offset of the new block
    ///
    /// The chosen free block is consumed whole on an exact fit. Otherwise
    /// its low `size` bytes are carved off and the block shrinks in place,
    /// keeping its position in the free list.
    pub fn allocate(&mut self, size: u64) -> Result<u64> {
        if size == 0 {
            return Err(PoolError::ZeroSize);
        }

        let index = self
            .strategy
            .select(self.free.iter(), size)
            .ok_or(PoolError::NoFit { requested: size })?;

        let chosen = *self
            .free
            .get(index)
            .ok_or(PoolError::NoFit { requested: size })?;

        let (carved, rest) = chosen.split(size);
        match rest {
            Some(rest) => {
                debug!(
                    "Split free block at {} ({} bytes): allocated {}, {} bytes left at {}",
                    chosen.offset, chosen.length, size, rest.length, rest.offset
                );
                self.free.set(index, rest);
            }
            None => {
                debug!("Exact fit: free block at {} ({} bytes)", chosen.offset, size);
                self.free.remove(index);
            }
        }

        self.allocated.push_front(carved);

        Ok(carved.offset)
    }

    /// Release the allocation starting at `offset`
    ///
    /// The block is pushed at the head of the free list with its length
    /// unchanged. Unknown offsets leave both lists untouched.
    pub fn free(&mut self, offset: u64) -> Result<()> {
        let index = match self.allocated.position_of(offset) {
            Some(index) => index,
            None => {
                warn!("Free of unknown offset {}", offset);
                return Err(PoolError::UnknownOffset(offset));
            }
        };

        let block = self
            .allocated
            .remove(index)
            .ok_or(PoolError::UnknownOffset(offset))?;

        debug!("Freed block at {} ({} bytes)", block.offset, block.length);
        self.free.push_front(block);

        Ok(())
    }

    /// Snapshot of usage and fragmentation
    pub fn stats(&self) -> PoolStats {
        PoolStats::collect(self.capacity, self.strategy, &self.free, &self.allocated)
    }

    /// Address-ordered view of every block, adjacent free rows merged
    pub fn layout(&self) -> Layout {
        self.layout_with(true)
    }

    /// Address-ordered view of every block
    ///
    /// With `coalesce_free` set, byte-adjacent free blocks are shown as a
    /// single row. The lists are not modified either way.
    pub fn layout_with(&self, coalesce_free: bool) -> Layout {
        Layout::new(
            self.capacity,
            self.free.sorted_by_offset(),
            self.allocated.sorted_by_offset(),
            coalesce_free,
        )
    }

    /// Release all bookkeeping
    pub fn cleanup(mut self) {
        info!(
            "Pool cleaned up ({} live allocations dropped)",
            self.allocated.len()
        );
        self.free.clear();
        self.allocated.clear();
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Free blocks in list order
    pub fn free_list(&self) -> &BlockList {
        &self.free
    }

    /// Allocated blocks in list order
    pub fn allocated_list(&self) -> &BlockList {
        &self.allocated
    }

    /// Length of the allocation at `offset`, if there is one
    pub fn allocation_size(&self, offset: u64) -> Option<u64> {
        self.allocated
            .position_of(offset)
            .and_then(|index| self.allocated.get(index))
            .map(|block| block.length)
    }

    /// Verify conservation and non-overlap of all blocks
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let free_total = self.free.total_length();
        let allocated_total = self.allocated.total_length();
        if free_total + allocated_total != self.capacity {
            return Err(format!(
                "free {} + allocated {} != capacity {}",
                free_total, allocated_total, self.capacity
            ));
        }

        let mut all: Vec<Block> = self.free.iter().chain(self.allocated.iter()).copied().collect();
        all.sort_unstable_by_key(|block| block.offset);

        for block in &all {
            if block.length == 0 {
                return Err(format!("zero-length block at {}", block.offset));
            }
            if block.end() > self.capacity {
                return Err(format!("block at {} runs past capacity", block.offset));
            }
        }

        for pair in all.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(format!(
                    "blocks at {} and {} overlap",
                    pair[0].offset, pair[1].offset
                ));
            }
        }

        Ok(())
    }
}

impl BlockAllocator for Engine {
    fn allocate(&mut self, size: u64) -> Result<u64> {
        Engine::allocate(self, size)
    }

    fn free(&mut self, offset: u64) -> Result<()> {
        Engine::free(self, offset)
    }

    fn fragmentation_score(&self) -> f64 {
        self.stats().fragmentation()
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn free_bytes(&self) -> u64 {
        self.stats().total_free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(list: &BlockList) -> Vec<(u64, u64)> {
        list.iter().map(|b| (b.offset, b.length)).collect()
    }

    /// Free list {0,10}, {20,50}, {80,20} with the rest allocated
    fn fragmented(strategy: Strategy) -> Engine {
        let mut engine = Engine::new(100, strategy).unwrap();
        for size in [10, 10, 50, 10, 20] {
            engine.allocate(size).unwrap();
        }
        engine.free(80).unwrap();
        engine.free(20).unwrap();
        engine.free(0).unwrap();
        engine
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(1000, Strategy::FirstFit).unwrap();
        assert_eq!(engine.capacity(), 1000);
        assert_eq!(offsets(engine.free_list()), vec![(0, 1000)]);
        assert!(engine.allocated_list().is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = Engine::new(0, Strategy::BestFit);
        assert!(matches!(result, Err(PoolError::ZeroCapacity)));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut engine = Engine::new(10, Strategy::FirstFit).unwrap();
        assert!(matches!(engine.allocate(0), Err(PoolError::ZeroSize)));
        assert_eq!(offsets(engine.free_list()), vec![(0, 10)]);
    }

    #[test]
    fn test_split_keeps_low_part() {
        let mut engine = Engine::new(100, Strategy::FirstFit).unwrap();

        assert_eq!(engine.allocate(30).unwrap(), 0);
        assert_eq!(engine.allocate(20).unwrap(), 30);

        assert_eq!(offsets(engine.free_list()), vec![(50, 50)]);
        assert_eq!(offsets(engine.allocated_list()), vec![(30, 20), (0, 30)]);
    }

    #[test]
    fn test_exact_fit_moves_block() {
        let mut engine = Engine::new(100, Strategy::FirstFit).unwrap();
        assert_eq!(engine.allocate(100).unwrap(), 0);
        assert!(engine.free_list().is_empty());
        assert_eq!(offsets(engine.allocated_list()), vec![(0, 100)]);
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut engine = Engine::new(100, Strategy::FirstFit).unwrap();
        assert_eq!(engine.allocate(60).unwrap(), 0);

        let result = engine.allocate(60);
        assert!(matches!(result, Err(PoolError::NoFit { requested: 60 })));
        assert_eq!(offsets(engine.free_list()), vec![(60, 40)]);
    }

    #[test]
    fn test_free_pushes_at_head_without_merging() {
        let engine = fragmented(Strategy::FirstFit);
        assert_eq!(
            offsets(engine.free_list()),
            vec![(0, 10), (20, 50), (80, 20)]
        );
        assert_eq!(engine.stats().count, 2);
    }

    #[test]
    fn test_free_does_not_coalesce_neighbours() {
        let mut engine = Engine::new(30, Strategy::FirstFit).unwrap();
        let a = engine.allocate(10).unwrap();
        let b = engine.allocate(10).unwrap();
        engine.free(a).unwrap();
        engine.free(b).unwrap();

        assert_eq!(
            offsets(engine.free_list()),
            vec![(10, 10), (0, 10), (20, 10)]
        );
        // A request spanning both freed neighbours cannot be served from them
        assert_eq!(engine.allocate(20).err().map(|e| e.is_not_found()), Some(true));
    }

    #[test]
    fn test_first_fit_sees_recent_frees_first() {
        let mut engine = fragmented(Strategy::FirstFit);
        // {0,10} is at the head, so it wins over the larger blocks
        assert_eq!(engine.allocate(5).unwrap(), 0);
        assert_eq!(
            offsets(engine.free_list()),
            vec![(5, 5), (20, 50), (80, 20)]
        );
    }

    #[test]
    fn test_best_fit_selection() {
        let mut engine = fragmented(Strategy::BestFit);

        // {80,20} is the smallest block holding 15 bytes
        assert_eq!(engine.allocate(15).unwrap(), 80);
        assert_eq!(
            offsets(engine.free_list()),
            vec![(0, 10), (20, 50), (95, 5)]
        );

        // Only {20,50} holds 21 bytes
        assert_eq!(engine.allocate(21).unwrap(), 20);
        assert_eq!(engine.allocation_size(20), Some(21));
        assert_eq!(
            offsets(engine.free_list()),
            vec![(0, 10), (41, 29), (95, 5)]
        );
    }

    #[test]
    fn test_worst_fit_selection() {
        let mut engine = fragmented(Strategy::WorstFit);

        assert_eq!(engine.allocate(5).unwrap(), 20);
        assert_eq!(
            offsets(engine.free_list()),
            vec![(0, 10), (25, 45), (80, 20)]
        );
    }

    #[test]
    fn test_free_unknown_offset() {
        let mut engine = fragmented(Strategy::BestFit);
        let free_before = engine.free_list().clone();
        let allocated_before = engine.allocated_list().clone();

        let result = engine.free(999);
        assert!(matches!(result, Err(PoolError::UnknownOffset(999))));
        assert_eq!(engine.free_list(), &free_before);
        assert_eq!(engine.allocated_list(), &allocated_before);

        // Offsets inside a live block are not handles
        assert!(engine.free(11).is_err());
    }

    #[test]
    fn test_double_free() {
        let mut engine = Engine::new(64, Strategy::FirstFit).unwrap();
        let offset = engine.allocate(16).unwrap();
        engine.free(offset).unwrap();
        assert!(matches!(engine.free(offset), Err(PoolError::UnknownOffset(0))));
    }

    #[test]
    fn test_freed_length_unchanged() {
        let mut engine = Engine::new(100, Strategy::FirstFit).unwrap();
        let offset = engine.allocate(25).unwrap();
        engine.free(offset).unwrap();

        assert_eq!(engine.free_list().get(0), Some(&Block::new(0, 25)));
        assert_eq!(engine.free_list().total_length(), 100);
    }

    #[test]
    fn test_invariants_hold() {
        let mut engine = fragmented(Strategy::WorstFit);
        engine.check_invariants().unwrap();
        engine.allocate(7).unwrap();
        engine.check_invariants().unwrap();
    }

    #[test]
    fn test_via_trait() {
        let mut engine = Engine::new(1000, Strategy::BestFit).unwrap();
        let alloc: &mut dyn BlockAllocator = &mut engine;

        let a = alloc.allocate(100).unwrap();
        let _b = alloc.allocate(100).unwrap();
        assert_eq!(alloc.free_bytes(), 800);
        assert_eq!(alloc.fragmentation_score(), 0.0);

        alloc.free(a).unwrap();
        assert_eq!(alloc.free_bytes(), 900);
        assert!(alloc.fragmentation_score() > 0.0);
        assert_eq!(alloc.capacity(), 1000);
    }
}
