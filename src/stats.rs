//! Usage and fragmentation statistics
//!
//! Fragments are computed on a sorted copy of the free list, merging blocks
//! that touch end-to-start. The free list itself is never modified.

use crate::allocator::block::Block;
use crate::allocator::list::BlockList;
use crate::allocator::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time statistics for a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Total pool size in bytes
    pub capacity: u64,
    /// Placement strategy in effect
    pub strategy: Strategy,
    /// Number of live allocations
    pub count: usize,
    /// Bytes held by live allocations
    pub total_allocated: u64,
    /// Bytes not allocated (`capacity - total_allocated`)
    pub total_free: u64,
    /// Longest run of byte-adjacent free blocks
    pub largest_free_extent: u64,
    /// Number of free runs after merging adjacent blocks
    pub free_fragment_count: usize,
    /// Raw number of entries in the free list
    pub free_block_count: usize,
}

impl PoolStats {
    pub(crate) fn collect(
        capacity: u64,
        strategy: Strategy,
        free: &BlockList,
        allocated: &BlockList,
    ) -> Self {
        let total_allocated = allocated.total_length();
        let runs = free_runs(free);

        PoolStats {
            capacity,
            strategy,
            count: allocated.len(),
            total_allocated,
            total_free: capacity - total_allocated,
            largest_free_extent: runs.iter().map(|run| run.length).max().unwrap_or(0),
            free_fragment_count: runs.len(),
            free_block_count: free.len(),
        }
    }

    /// Share of free space outside the largest free run
    ///
    /// 0.0 when all free space is contiguous (or there is none), approaching
    /// 1.0 as free space scatters into small runs.
    pub fn fragmentation(&self) -> f64 {
        if self.total_free == 0 {
            return 0.0;
        }

        let largest = self.largest_free_extent.min(self.total_free) as f64;
        (1.0 - largest / self.total_free as f64).clamp(0.0, 1.0)
    }

    /// Fraction of the pool currently allocated
    pub fn utilization(&self) -> f64 {
        self.total_allocated as f64 / self.capacity as f64
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory statistics ({}, {} bytes):", self.strategy, self.capacity)?;
        writeln!(f, "  Total allocations:   {}", self.count)?;
        writeln!(f, "  Allocated:           {} bytes", self.total_allocated)?;
        writeln!(f, "  Free:                {} bytes", self.total_free)?;
        writeln!(f, "  Largest free extent: {} bytes", self.largest_free_extent)?;
        writeln!(
            f,
            "  Free fragments:      {} ({} list entries)",
            self.free_fragment_count, self.free_block_count
        )?;
        write!(f, "  Fragmentation:       {:.1}%", self.fragmentation() * 100.0)
    }
}

/// Merge byte-adjacent free blocks into maximal runs, in offset order
pub fn free_runs(free: &BlockList) -> Vec<Block> {
    let mut runs: Vec<Block> = Vec::with_capacity(free.len());

    for block in free.sorted_by_offset() {
        if let Some(merged) = runs.last().and_then(|last| last.coalesce(&block)) {
            runs.pop();
            runs.push(merged);
        } else {
            runs.push(block);
        }
    }

    runs
}
