//! # poolsim - Placement Strategy Simulator
//!
//! `poolsim` simulates a memory allocator over a single contiguous pool so
//! that first-fit, best-fit and worst-fit placement can be inspected side by
//! side. No real memory is reserved: every address is an offset into the
//! simulated pool.
//!
//! - **Two block lists**: free and allocated, both with head insertion
//! - **Three strategies**: first fit, best fit, worst fit
//! - **Splitting** of oversized free blocks on allocation
//! - **No merging on free**: fragmentation builds up and stays visible
//! - **Read-only views**: statistics and an address-ordered layout
//!
//! ## Quick Start
//!
//! ```rust
//! use poolsim::{Simulator, Strategy, Result};
//!
//! # fn main() -> Result<()> {
//! let mut sim = Simulator::new();
//! sim.init(100, Strategy::FirstFit)?;
//!
//! let offset = sim.allocate(60)?;
//! assert_eq!(offset, 0);
//!
//! // Only 40 bytes remain
//! assert!(sim.allocate(60).unwrap_err().is_not_found());
//!
//! sim.free(offset)?;
//! println!("{}", sim.stats()?);
//! println!("{}", sim.layout()?);
//!
//! sim.cleanup()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Simulator  (Uninitialized/Active/Destroyed) │
//! ├─────────────────────────────────────────────┤
//! │ Engine                                      │
//! │  - capacity, strategy                       │
//! │  - free list      (head insertion)          │
//! │  - allocated list (head insertion)          │
//! ├─────────────────────────────────────────────┤
//! │ Views                                       │
//! │  - PoolStats: merged free runs, totals      │
//! │  - Layout: two-pointer merge by offset      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Modules:
//!
//! - [`error`] - Error types for pool operations
//! - [`allocator`] - Blocks, lists, strategies and the engine
//! - [`stats`] - Usage and fragmentation statistics
//! - [`layout`] - Address-ordered view of a pool
//! - [`simulator`] - Lifecycle-checked handle, plus a thread-safe wrapper
//! - [`config`] - TOML pool configuration

pub mod allocator;
pub mod config;
pub mod error;
pub mod layout;
pub mod simulator;
pub mod stats;

pub use crate::allocator::{
    block::Block, engine::Engine, list::BlockList, strategy::Strategy, BlockAllocator,
};
pub use crate::config::PoolConfig;
pub use crate::error::{ErrorKind, PoolError, Result};
pub use crate::layout::{BlockState, Layout, LayoutRow};
pub use crate::simulator::{SharedSimulator, Simulator};
pub use crate::stats::PoolStats;
