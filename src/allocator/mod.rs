//! Block allocation over a simulated pool
//!
//! The allocator is split into:
//! - [`block`] - the `{offset, length}` extent type
//! - [`list`] - head-insertion list used for free and allocated blocks
//! - [`strategy`] - first-fit, best-fit and worst-fit selection
//! - [`engine`] - the pool itself, tying the pieces together

pub mod block;
pub mod engine;
pub mod list;
pub mod strategy;

use crate::error::Result;

/// Block allocator trait
///
/// Defines the interface for allocating and freeing byte ranges in a pool.
pub trait BlockAllocator {
    /// Allocate `size` bytes
    ///
    /// Returns the offset of the allocated block.
    fn allocate(&mut self, size: u64) -> Result<u64>;

    /// Free the allocation starting at `offset`
    fn free(&mut self, offset: u64) -> Result<()>;

    /// Fragmentation score (0.0 = all free space contiguous, towards 1.0 = scattered)
    fn fragmentation_score(&self) -> f64;

    /// Total bytes managed
    fn capacity(&self) -> u64;

    /// Bytes not currently allocated
    fn free_bytes(&self) -> u64;
}
