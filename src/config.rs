//! Pool configuration
//!
//! A pool can be described in TOML:
//!
//! ```toml
//! capacity = 4096
//! strategy = "best-fit"
//! coalesce_free = true
//! ```
//!
//! `strategy` and `coalesce_free` are optional.

use crate::allocator::strategy::Strategy;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Settings for creating a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PoolConfig {
    /// Total pool size in bytes
    #[validate(range(min = 1))]
    pub capacity: u64,

    /// Placement strategy
    #[serde(default)]
    pub strategy: Strategy,

    /// Merge adjacent free rows in the layout view
    #[serde(default = "default_coalesce_free")]
    pub coalesce_free: bool,
}

fn default_coalesce_free() -> bool {
    true
}

impl PoolConfig {
    /// Config for a first-fit pool of `capacity` bytes
    pub fn new(capacity: u64) -> Self {
        PoolConfig {
            capacity,
            strategy: Strategy::default(),
            coalesce_free: default_coalesce_free(),
        }
    }

    /// Set the placement strategy
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable or disable free-row merging in layouts
    pub fn coalesce_free(mut self, coalesce: bool) -> Self {
        self.coalesce_free = coalesce;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PoolConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
