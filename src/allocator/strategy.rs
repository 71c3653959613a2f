//! Placement strategies
//!
//! - First fit: first block in list order that is large enough
//! - Best fit: smallest block that is large enough
//! - Worst fit: largest block that is large enough
//!
//! Ties between equally sized blocks go to the one seen first in list order.

use crate::allocator::block::Block;
use crate::error::PoolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block selection policy, fixed for the lifetime of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    FirstFit,
    BestFit,
    WorstFit,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::FirstFit, Strategy::BestFit, Strategy::WorstFit];

    /// Map a menu code to a strategy
    ///
    /// `1` is best fit, `2` is worst fit, anything else is first fit.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Strategy::BestFit,
            2 => Strategy::WorstFit,
            _ => Strategy::FirstFit,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Strategy::FirstFit => 0,
            Strategy::BestFit => 1,
            Strategy::WorstFit => 2,
        }
    }

    /// Pick the index of the block to carve `size` bytes from
    ///
    /// `blocks` is walked in list order. Returns `None` if no block holds
    /// at least `size` bytes.
    pub fn select<'a, I>(self, blocks: I, size: u64) -> Option<usize>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        let mut candidates = blocks
            .into_iter()
            .enumerate()
            .filter(|(_, block)| block.length >= size);

        match self {
            Strategy::FirstFit => candidates.next().map(|(index, _)| index),
            // Strict comparison keeps the first of several equal blocks
            Strategy::BestFit => candidates
                .fold(None, |chosen: Option<(usize, u64)>, (index, block)| match chosen {
                    Some((_, length)) if length <= block.length => chosen,
                    _ => Some((index, block.length)),
                })
                .map(|(index, _)| index),
            Strategy::WorstFit => candidates
                .fold(None, |chosen: Option<(usize, u64)>, (index, block)| match chosen {
                    Some((_, length)) if length >= block.length => chosen,
                    _ => Some((index, block.length)),
                })
                .map(|(index, _)| index),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::FirstFit => "First Fit",
            Strategy::BestFit => "Best Fit",
            Strategy::WorstFit => "Worst Fit",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "first" | "first-fit" | "first_fit" | "firstfit" => Ok(Strategy::FirstFit),
            "1" | "best" | "best-fit" | "best_fit" | "bestfit" => Ok(Strategy::BestFit),
            "2" | "worst" | "worst-fit" | "worst_fit" | "worstfit" => Ok(Strategy::WorstFit),
            other => Err(PoolError::Config(format!(
                "Invalid strategy '{}'. Valid options: first-fit, best-fit, worst-fit",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragmented() -> Vec<Block> {
        vec![Block::new(0, 10), Block::new(20, 50), Block::new(80, 20)]
    }

    #[test]
    fn test_first_fit_takes_list_order() {
        let blocks = fragmented();
        assert_eq!(Strategy::FirstFit.select(&blocks, 5), Some(0));
        assert_eq!(Strategy::FirstFit.select(&blocks, 15), Some(1));
        assert_eq!(Strategy::FirstFit.select(&blocks, 51), None);
    }

    #[test]
    fn test_best_fit_takes_smallest() {
        let blocks = fragmented();
        assert_eq!(Strategy::BestFit.select(&blocks, 15), Some(2));
        assert_eq!(Strategy::BestFit.select(&blocks, 21), Some(1));
        assert_eq!(Strategy::BestFit.select(&blocks, 5), Some(0));
    }

    #[test]
    fn test_worst_fit_takes_largest() {
        let blocks = fragmented();
        assert_eq!(Strategy::WorstFit.select(&blocks, 5), Some(1));
        assert_eq!(Strategy::WorstFit.select(&blocks, 50), Some(1));
        assert_eq!(Strategy::WorstFit.select(&blocks, 51), None);
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let blocks = vec![Block::new(50, 8), Block::new(0, 8), Block::new(20, 8)];
        assert_eq!(Strategy::BestFit.select(&blocks, 4), Some(0));
        assert_eq!(Strategy::WorstFit.select(&blocks, 4), Some(0));
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Strategy::from_code(0), Strategy::FirstFit);
        assert_eq!(Strategy::from_code(1), Strategy::BestFit);
        assert_eq!(Strategy::from_code(2), Strategy::WorstFit);
        assert_eq!(Strategy::from_code(7), Strategy::FirstFit);
        assert_eq!(Strategy::from_code(-1), Strategy::FirstFit);

        for strategy in Strategy::ALL {
            assert_eq!(Strategy::from_code(strategy.code() as i64), strategy);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("best-fit".parse::<Strategy>().unwrap(), Strategy::BestFit);
        assert_eq!("Worst_Fit".parse::<Strategy>().unwrap(), Strategy::WorstFit);
        assert_eq!("0".parse::<Strategy>().unwrap(), Strategy::FirstFit);
        assert!("next-fit".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Strategy::FirstFit.to_string(), "First Fit");
        assert_eq!(Strategy::WorstFit.to_string(), "Worst Fit");
    }
}
