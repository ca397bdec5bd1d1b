//! ArrayMap
//!
//! Translates a global index into `(block, offset)` and answers "how many
//! elements come before block i" without scanning every block on each call.
//!
//! The map keeps a prefix-sum checkpoint per block, `starts[i]`, together with
//! a boundary: the index of the first block whose checkpoint may be stale.
//! Everything at or below the boundary is valid and answered directly;
//! anything above it is recomputed forward from the boundary, and the boundary
//! is advanced past the blocks just validated.
//!
//! Structural mutations only ever lower the boundary, to the lowest block they
//! touched. It moves up again only after a completed recompute.
//!
//! Queries take `&self`. The checkpoints and boundary are atomics so that
//! read-only callers on several threads can share the same map and each
//! extend the validated prefix; every writer stores identical values, so the
//! race is benign. Structural mutation requires `&mut self`.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::block::Block;
use crate::profiling;

pub struct ArrayMap {
    /// `starts[i]` is the count of elements strictly before block `i`.
    /// There is one extra slot so `starts[block_count]` is the total.
    starts: Vec<AtomicUsize>,
    /// First block whose checkpoint may be stale.
    boundary: AtomicUsize,
    /// Cached logical count.
    len: usize,
}

impl ArrayMap {
    pub fn new() -> ArrayMap {
        return ArrayMap {
            starts: vec![AtomicUsize::new(0)],
            boundary: AtomicUsize::new(0),
            len: 0,
        };
    }

    /// Cached total element count.
    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.len;
    }

    /// The first block whose checkpoint may be stale.
    #[inline]
    pub fn boundary(&self) -> usize {
        return self.boundary.load(Ordering::Acquire);
    }

    /// Record a structural change at `block`.
    ///
    /// `block_count` and `len` describe the collection after the change.
    pub fn record_change(&mut self, block: usize, block_count: usize, len: usize) {
        if self.starts.len() != block_count + 1 {
            self.starts.resize_with(block_count + 1, || AtomicUsize::new(0));
        }
        let boundary = self.boundary.get_mut();
        *boundary = (*boundary).min(block).min(block_count);
        self.len = len;
    }

    /// Forget everything, as after a clear.
    pub fn reset(&mut self) {
        self.starts = vec![AtomicUsize::new(0)];
        *self.boundary.get_mut() = 0;
        self.len = 0;
    }

    /// Recompute every checkpoint and move the boundary to the end.
    pub fn recompute<T>(&mut self, blocks: &[Block<T>]) {
        self.starts.clear();
        self.starts.reserve(blocks.len() + 1);
        let mut cumulative = 0usize;
        self.starts.push(AtomicUsize::new(0));
        for block in blocks {
            cumulative += block.len();
            self.starts.push(AtomicUsize::new(cumulative));
        }
        *self.boundary.get_mut() = blocks.len();
        self.len = cumulative;
    }

    /// Count of elements before `block_index`. `block_index <= blocks.len()`.
    pub fn block_start<T>(&self, blocks: &[Block<T>], block_index: usize) -> usize {
        debug_assert!(block_index <= blocks.len());
        let boundary = self.boundary();
        if block_index <= boundary {
            profiling::array_map_hit();
            return self.starts[block_index].load(Ordering::Relaxed);
        }

        profiling::array_map_miss();
        let mut cumulative = self.starts[boundary].load(Ordering::Relaxed);
        for i in boundary..block_index {
            cumulative += blocks[i].len();
            self.starts[i + 1].store(cumulative, Ordering::Relaxed);
        }
        self.boundary.fetch_max(block_index, Ordering::Release);
        return cumulative;
    }

    /// Resolve a global index into `(block_index, offset)`.
    ///
    /// Returns `None` when `index >= len`.
    pub fn locate<T>(&self, blocks: &[Block<T>], index: usize) -> Option<(usize, usize)> {
        if index >= self.len {
            return None;
        }

        let boundary = self.boundary();
        let validated = self.starts[boundary].load(Ordering::Relaxed);
        if index < validated {
            profiling::array_map_hit();
            // Largest block whose start is <= index; empty blocks share a
            // start with their successor, so this lands on the non-empty one.
            let starts = &self.starts[..=boundary];
            let mut lo = 0usize;
            let mut hi = boundary;
            while lo + 1 < hi {
                let mid = lo + (hi - lo) / 2;
                if starts[mid].load(Ordering::Relaxed) <= index {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            let start = starts[lo].load(Ordering::Relaxed);
            return Some((lo, index - start));
        }

        profiling::array_map_miss();
        let mut cumulative = validated;
        for i in boundary..blocks.len() {
            let next = cumulative + blocks[i].len();
            self.starts[i + 1].store(next, Ordering::Relaxed);
            if next > index {
                self.boundary.fetch_max(i + 1, Ordering::Release);
                return Some((i, index - cumulative));
            }
            cumulative = next;
        }
        return None;
    }

    /// Resolve an insertion point. `index == len` maps to the end of the last
    /// block; `None` when there are no blocks or `index > len`.
    pub fn locate_insert<T>(&self, blocks: &[Block<T>], index: usize) -> Option<(usize, usize)> {
        if index == self.len {
            let last = blocks.len().checked_sub(1)?;
            return Some((last, blocks[last].len()));
        }
        return self.locate(blocks, index);
    }
}

impl Default for ArrayMap {
    fn default() -> Self {
        return ArrayMap::new();
    }
}

impl Clone for ArrayMap {
    fn clone(&self) -> Self {
        return ArrayMap {
            starts: self
                .starts
                .iter()
                .map(|start| AtomicUsize::new(start.load(Ordering::Relaxed)))
                .collect(),
            boundary: AtomicUsize::new(self.boundary()),
            len: self.len,
        };
    }
}

impl std::fmt::Debug for ArrayMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f
            .debug_struct("ArrayMap")
            .field("boundary", &self.boundary())
            .field("len", &self.len)
            .finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(lens: &[usize]) -> Vec<Block<usize>> {
        let mut next = 0;
        return lens
            .iter()
            .map(|&len| {
                let items: Vec<usize> = (next..next + len).collect();
                next += len;
                Block::from_vec(items)
            })
            .collect();
    }

    fn fresh(blocks: &[Block<usize>]) -> ArrayMap {
        let mut map = ArrayMap::new();
        let len = blocks.iter().map(|b| b.len()).sum();
        map.record_change(0, blocks.len(), len);
        return map;
    }

    #[test]
    fn locate_matches_reference() {
        let blocks = blocks(&[3, 5, 1, 4]);
        let map = fresh(&blocks);

        let mut expected = Vec::new();
        for (b, block) in blocks.iter().enumerate() {
            for offset in 0..block.len() {
                expected.push((b, offset));
            }
        }

        for (index, &location) in expected.iter().enumerate() {
            assert_eq!(map.locate(&blocks, index), Some(location));
        }
        assert_eq!(map.locate(&blocks, 13), None);
    }

    #[test]
    fn query_advances_boundary() {
        let blocks = blocks(&[4, 4, 4, 4]);
        let map = fresh(&blocks);
        assert_eq!(map.boundary(), 0);

        assert_eq!(map.locate(&blocks, 9), Some((2, 1)));
        assert_eq!(map.boundary(), 3);

        // Below the boundary, answered from the checkpoints.
        assert_eq!(map.locate(&blocks, 5), Some((1, 1)));
        assert_eq!(map.boundary(), 3);

        assert_eq!(map.block_start(&blocks, 4), 16);
        assert_eq!(map.boundary(), 4);
    }

    #[test]
    fn mutation_only_lowers_boundary() {
        let mut blocks = blocks(&[2, 2, 2]);
        let mut map = fresh(&blocks);
        map.recompute(&blocks);
        assert_eq!(map.boundary(), 3);

        blocks[2].push(99);
        map.record_change(2, 3, 7);
        assert_eq!(map.boundary(), 2);

        blocks[1].push(98);
        map.record_change(1, 3, 8);
        assert_eq!(map.boundary(), 1);

        // A later change above the boundary leaves it alone.
        blocks[2].push(97);
        map.record_change(2, 3, 9);
        assert_eq!(map.boundary(), 1);

        assert_eq!(map.block_start(&blocks, 3), 9);
        assert_eq!(map.locate(&blocks, 8), Some((2, 3)));
    }

    #[test]
    fn skips_empty_blocks() {
        let blocks = blocks(&[2, 0, 3]);
        let mut map = fresh(&blocks);
        map.recompute(&blocks);
        assert_eq!(map.locate(&blocks, 1), Some((0, 1)));
        assert_eq!(map.locate(&blocks, 2), Some((2, 0)));
    }

    #[test]
    fn locate_insert_at_end() {
        let blocks = blocks(&[2, 3]);
        let map = fresh(&blocks);
        assert_eq!(map.locate_insert(&blocks, 5), Some((1, 3)));
        assert_eq!(map.locate_insert(&blocks, 2), Some((1, 0)));
        assert_eq!(map.locate_insert(&blocks, 6), None);

        let empty: Vec<Block<usize>> = Vec::new();
        assert_eq!(ArrayMap::new().locate_insert(&empty, 0), None);
    }
}
