//! Address-ordered view of a pool
//!
//! A [`Layout`] holds offset-sorted snapshots of the free and allocated
//! lists and walks them together with a two-pointer merge. Iteration is
//! lazy and can be restarted any number of times via [`Layout::iter`].
//!
//! ```text
//!   free:       [0..10)          [20..70)         [80..100)
//!   allocated:         [10..20)          [70..80)
//!                  │
//!                  ▼
//!   rows:       F[0..10) A[10..20) F[20..70) A[70..80) F[80..100)
//! ```

use crate::allocator::block::Block;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a layout row is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockState {
    Free,
    Allocated,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockState::Free => f.write_str("Free"),
            BlockState::Allocated => f.write_str("Allocated"),
        }
    }
}

/// One row of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRow {
    pub offset: u64,
    /// One past the last byte
    pub end: u64,
    pub length: u64,
    pub state: BlockState,
}

impl LayoutRow {
    fn new(block: Block, state: BlockState) -> Self {
        LayoutRow {
            offset: block.offset,
            end: block.end(),
            length: block.length,
            state,
        }
    }
}

impl fmt::Display for LayoutRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#010x} - {:#010x}  {:>10} bytes  {}",
            self.offset, self.end, self.length, self.state
        )
    }
}

/// Read-only snapshot of a pool, ordered by offset
#[derive(Debug, Clone)]
pub struct Layout {
    capacity: u64,
    free: Vec<Block>,
    allocated: Vec<Block>,
    coalesce_free: bool,
}

impl Layout {
    /// Build a layout from offset-sorted block snapshots
    pub fn new(capacity: u64, free: Vec<Block>, allocated: Vec<Block>, coalesce_free: bool) -> Self {
        debug_assert!(free.windows(2).all(|w| w[0].offset < w[1].offset));
        debug_assert!(allocated.windows(2).all(|w| w[0].offset < w[1].offset));

        Layout {
            capacity,
            free,
            allocated,
            coalesce_free,
        }
    }

    /// Walk the rows from offset 0 upwards
    pub fn iter(&self) -> LayoutIter<'_> {
        LayoutIter {
            layout: self,
            next_free: 0,
            next_allocated: 0,
        }
    }

    pub fn rows(&self) -> Vec<LayoutRow> {
        self.iter().collect()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = LayoutRow;
    type IntoIter = LayoutIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pool layout ({} bytes):", self.capacity)?;
        for row in self {
            writeln!(f, "  {}", row)?;
        }
        Ok(())
    }
}

/// Lazy two-pointer merge over a [`Layout`]
#[derive(Debug, Clone)]
pub struct LayoutIter<'a> {
    layout: &'a Layout,
    next_free: usize,
    next_allocated: usize,
}

impl Iterator for LayoutIter<'_> {
    type Item = LayoutRow;

    fn next(&mut self) -> Option<LayoutRow> {
        let free = self.layout.free.get(self.next_free);
        let allocated = self.layout.allocated.get(self.next_allocated);

        let take_free = match (free, allocated) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(f), Some(a)) => f.offset < a.offset,
        };

        if !take_free {
            let block = self.layout.allocated[self.next_allocated];
            self.next_allocated += 1;
            return Some(LayoutRow::new(block, BlockState::Allocated));
        }

        let mut run = self.layout.free[self.next_free];
        self.next_free += 1;

        if self.layout.coalesce_free {
            // No allocated block can start inside a free run, so the next
            // free block at the run's end is also the next row overall.
            while let Some(merged) = self
                .layout
                .free
                .get(self.next_free)
                .and_then(|next| run.coalesce(next))
            {
                run = merged;
                self.next_free += 1;
            }
        }

        Some(LayoutRow::new(run, BlockState::Free))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_allocated = self.layout.allocated.len() - self.next_allocated;
        let remaining_free = self.layout.free.len() - self.next_free;
        let lower = remaining_allocated + usize::from(remaining_free > 0);
        (lower, Some(remaining_allocated + remaining_free))
    }
}

impl std::iter::FusedIterator for LayoutIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(extents: &[(u64, u64)]) -> Vec<Block> {
        extents.iter().map(|&(o, l)| Block::new(o, l)).collect()
    }

    fn fragmented(coalesce: bool) -> Layout {
        Layout::new(
            100,
            blocks(&[(0, 10), (20, 50), (80, 20)]),
            blocks(&[(10, 10), (70, 10)]),
            coalesce,
        )
    }

    #[test]
    fn test_rows_in_offset_order() {
        let rows = fragmented(true).rows();
        let summary: Vec<(u64, u64, BlockState)> =
            rows.iter().map(|r| (r.offset, r.length, r.state)).collect();

        assert_eq!(
            summary,
            vec![
                (0, 10, BlockState::Free),
                (10, 10, BlockState::Allocated),
                (20, 50, BlockState::Free),
                (70, 10, BlockState::Allocated),
                (80, 20, BlockState::Free),
            ]
        );
    }

    #[test]
    fn test_rows_cover_pool() {
        let layout = fragmented(true);
        let mut cursor = 0;
        for row in &layout {
            assert_eq!(row.offset, cursor);
            assert_eq!(row.end, row.offset + row.length);
            cursor = row.end;
        }
        assert_eq!(cursor, layout.capacity());
    }

    #[test]
    fn test_coalesces_adjacent_free_rows() {
        let free = blocks(&[(0, 10), (10, 10), (20, 5), (40, 10)]);
        let allocated = blocks(&[(25, 15)]);

        let merged = Layout::new(50, free.clone(), allocated.clone(), true).rows();
        assert_eq!(merged.len(), 3);
        assert_eq!((merged[0].offset, merged[0].length), (0, 25));
        assert_eq!(merged[0].state, BlockState::Free);

        let raw = Layout::new(50, free, allocated, false).rows();
        assert_eq!(raw.len(), 5);
    }

    #[test]
    fn test_restartable() {
        let layout = fragmented(false);
        let first: Vec<LayoutRow> = layout.iter().collect();
        let second: Vec<LayoutRow> = layout.iter().collect();
        assert_eq!(first, second);

        let mut partial = layout.iter();
        partial.next();
        assert_eq!(partial.count(), 4);
    }

    #[test]
    fn test_all_allocated() {
        let layout = Layout::new(8, Vec::new(), blocks(&[(0, 4), (4, 4)]), true);
        let rows = layout.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.state == BlockState::Allocated));
    }

    #[test]
    fn test_display() {
        let text = fragmented(true).to_string();
        assert!(text.starts_with("Pool layout (100 bytes):"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("Allocated"));
    }
}
