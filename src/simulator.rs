//! Lifecycle-checked pool handle
//!
//! ```text
//!   Uninitialized ──init──▶ Active ──cleanup──▶ Destroyed
//! ```
//!
//! Every operation other than `init` requires an active pool. `init` on an
//! active pool is refused rather than replacing it, and a destroyed
//! simulator stays destroyed.

use crate::allocator::engine::Engine;
use crate::allocator::strategy::Strategy;
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::layout::Layout;
use crate::stats::PoolStats;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
enum PoolState {
    Uninitialized,
    Active { engine: Engine, coalesce_free: bool },
    Destroyed,
}

/// A pool slot that enforces the init/use/cleanup lifecycle
#[derive(Debug)]
pub struct Simulator {
    state: PoolState,
}

impl Simulator {
    pub fn new() -> Self {
        Simulator {
            state: PoolState::Uninitialized,
        }
    }

    /// Create the pool
    pub fn init(&mut self, capacity: u64, strategy: Strategy) -> Result<()> {
        self.init_with(&PoolConfig::new(capacity).strategy(strategy))
    }

    /// Create the pool from a config
    pub fn init_with(&mut self, config: &PoolConfig) -> Result<()> {
        match self.state {
            PoolState::Uninitialized => {}
            PoolState::Active { .. } => return Err(PoolError::AlreadyInitialized),
            PoolState::Destroyed => return Err(PoolError::Destroyed),
        }

        let engine = Engine::new(config.capacity, config.strategy)?;
        self.state = PoolState::Active {
            engine,
            coalesce_free: config.coalesce_free,
        };

        Ok(())
    }

    pub fn allocate(&mut self, size: u64) -> Result<u64> {
        self.engine_mut()?.allocate(size)
    }

    pub fn free(&mut self, offset: u64) -> Result<()> {
        self.engine_mut()?.free(offset)
    }

    pub fn stats(&self) -> Result<PoolStats> {
        Ok(self.engine()?.stats())
    }

    /// Address-ordered view, merging free rows if the config asked for it
    pub fn layout(&self) -> Result<Layout> {
        match &self.state {
            PoolState::Active {
                engine,
                coalesce_free,
            } => Ok(engine.layout_with(*coalesce_free)),
            _ => Err(self.inactive_error()),
        }
    }

    /// Tear the pool down; the simulator cannot be reused afterwards
    pub fn cleanup(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, PoolState::Destroyed) {
            PoolState::Active { engine, .. } => {
                engine.cleanup();
                Ok(())
            }
            PoolState::Uninitialized => {
                debug!("Cleanup requested before init");
                self.state = PoolState::Uninitialized;
                Err(PoolError::NotInitialized)
            }
            PoolState::Destroyed => Err(PoolError::Destroyed),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PoolState::Active { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, PoolState::Destroyed)
    }

    /// Borrow the active engine
    pub fn engine(&self) -> Result<&Engine> {
        match &self.state {
            PoolState::Active { engine, .. } => Ok(engine),
            _ => Err(self.inactive_error()),
        }
    }

    fn engine_mut(&mut self) -> Result<&mut Engine> {
        match &mut self.state {
            PoolState::Active { engine, .. } => Ok(engine),
            PoolState::Uninitialized => Err(PoolError::NotInitialized),
            PoolState::Destroyed => Err(PoolError::Destroyed),
        }
    }

    fn inactive_error(&self) -> PoolError {
        match self.state {
            PoolState::Destroyed => PoolError::Destroyed,
            _ => PoolError::NotInitialized,
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

/// A simulator shared between threads
///
/// Every operation holds one lock for its whole duration, since allocate
/// and free both need a consistent view of both lists.
#[derive(Debug, Clone, Default)]
pub struct SharedSimulator {
    inner: Arc<Mutex<Simulator>>,
}

impl SharedSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self, capacity: u64, strategy: Strategy) -> Result<()> {
        self.inner.lock().init(capacity, strategy)
    }

    pub fn init_with(&self, config: &PoolConfig) -> Result<()> {
        self.inner.lock().init_with(config)
    }

    pub fn allocate(&self, size: u64) -> Result<u64> {
        self.inner.lock().allocate(size)
    }

    pub fn free(&self, offset: u64) -> Result<()> {
        self.inner.lock().free(offset)
    }

    pub fn stats(&self) -> Result<PoolStats> {
        self.inner.lock().stats()
    }

    pub fn layout(&self) -> Result<Layout> {
        self.inner.lock().layout()
    }

    pub fn cleanup(&self) -> Result<()> {
        self.inner.lock().cleanup()
    }

    /// Run `f` against the simulator under the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulator) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}
