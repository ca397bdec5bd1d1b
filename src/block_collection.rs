//! BlockCollection
//!
//! The segmented storage engine: an ordered sequence of [`Block`]s presented
//! as one logical 0-based sequence.
//!
//! - Index resolution goes through the [`ArrayMap`], so repeated lookups
//!   after a mutation only rescan the blocks past the lowest changed one.
//! - Sizing decisions (new block size, split threshold, rebalance target)
//!   come from a [`Balancer`].
//! - Inserting into a full block splits it at its midpoint; removals merge a
//!   nearly empty block into its smaller neighbour, unless the policy keeps
//!   sizes uniform.
//!
//! Every fallible operation validates its arguments before touching any
//! block, so an error always leaves the collection unchanged.

use std::sync::Arc;

use crate::array_map::ArrayMap;
use crate::balancer::{Balancer, FixedBalancer};
use crate::block::Block;
use crate::error::{Error, Result};
use crate::profiling;
use crate::range::{MultiBlockRange, Range};

/// A block below `default_block_size / LOW_WATER_DIVISOR` is merge-eligible.
pub const LOW_WATER_DIVISOR: usize = 4;

#[derive(Clone, Debug)]
pub struct BlockCollection<T> {
    blocks: Vec<Block<T>>,
    map: ArrayMap,
    balancer: Arc<dyn Balancer>,
}

impl<T> BlockCollection<T> {
    pub fn new(balancer: Arc<dyn Balancer>) -> BlockCollection<T> {
        return BlockCollection {
            blocks: Vec::new(),
            map: ArrayMap::new(),
            balancer,
        };
    }

    /// Create an empty collection with room for `capacity` elements worth of
    /// block handles.
    pub fn with_capacity(balancer: Arc<dyn Balancer>, capacity: usize) -> BlockCollection<T> {
        let per_block = balancer.default_block_size(0).max(1);
        let mut collection = BlockCollection::new(balancer);
        collection.blocks.reserve(capacity.div_ceil(per_block));
        return collection;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.map.len();
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.map.len() == 0;
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        return self.blocks.len();
    }

    /// Read-only view of the blocks in logical order.
    #[inline]
    pub fn blocks(&self) -> &[Block<T>] {
        return &self.blocks;
    }

    pub fn block_lens(&self) -> Vec<usize> {
        return self.blocks.iter().map(|b| b.len()).collect();
    }

    pub fn balancer(&self) -> &Arc<dyn Balancer> {
        return &self.balancer;
    }

    pub fn array_map(&self) -> &ArrayMap {
        return &self.map;
    }

    #[inline]
    fn max_size(&self, block_index: usize) -> usize {
        return self.balancer.max_block_size(block_index).max(1);
    }

    #[inline]
    fn target_size(&self, block_index: usize) -> usize {
        let max = self.max_size(block_index);
        return self.balancer.default_block_size(block_index).clamp(1, max);
    }

    fn record_change(&mut self, block_index: usize, len: usize) {
        self.map.record_change(block_index, self.blocks.len(), len);
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// Resolve a global index into `(block_index, offset)`.
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        return self.map.locate(&self.blocks, index);
    }

    /// Inverse of [`locate`](Self::locate).
    pub fn global_index(&self, block_index: usize, offset: usize) -> Option<usize> {
        let block = self.blocks.get(block_index)?;
        if offset >= block.len() {
            return None;
        }
        return Some(self.map.block_start(&self.blocks, block_index) + offset);
    }

    /// Decompose a logical span into per-block local spans.
    pub fn block_ranges(&self, range: Range) -> Result<MultiBlockRange> {
        range.check_within(self.len())?;
        if range.is_empty() {
            let start_block = self.locate(range.index).map_or(self.blocks.len(), |(b, _)| b);
            return Ok(MultiBlockRange::new(start_block));
        }

        let (mut block_index, mut offset) = self.locate(range.index).ok_or(Error::IndexOutOfRange {
            index: range.index,
            len: self.len(),
        })?;
        let mut spans = MultiBlockRange::new(block_index);
        let mut remaining = range.count;
        while remaining > 0 {
            let available = self.blocks[block_index].len() - offset;
            let take = available.min(remaining);
            spans.push(Range::new(offset, take));
            remaining -= take;
            block_index += 1;
            offset = 0;
        }
        return Ok(spans);
    }

    // =========================================================================
    // Element access
    // =========================================================================

    pub fn get(&self, index: usize) -> Option<&T> {
        let (block_index, offset) = self.locate(index)?;
        return self.blocks[block_index].get(offset);
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (block_index, offset) = self.locate(index)?;
        return self.blocks[block_index].get_mut(offset);
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&mut self, index: usize, item: T) -> Result<T> {
        let len = self.len();
        let (block_index, offset) = self.locate(index).ok_or(Error::IndexOutOfRange { index, len })?;
        return Ok(self.blocks[block_index].set(offset, item));
    }

    pub fn iter(&self) -> Iter<'_, T> {
        return Iter {
            blocks: &self.blocks,
            front: (0, 0),
            back: (self.blocks.len(), 0),
            remaining: self.len(),
        };
    }

    /// Iterate over a logical span only.
    pub fn range_iter(&self, range: Range) -> Result<Iter<'_, T>> {
        range.check_within(self.len())?;
        if range.is_empty() {
            return Ok(Iter {
                blocks: &self.blocks,
                front: (0, 0),
                back: (0, 0),
                remaining: 0,
            });
        }
        let len = self.len();
        let front = self.locate(range.index).ok_or(Error::IndexOutOfRange { index: range.index, len })?;
        let last = range.end() - 1;
        let (back_block, back_offset) = self.locate(last).ok_or(Error::IndexOutOfRange { index: last, len })?;
        return Ok(Iter {
            blocks: &self.blocks,
            front,
            back: (back_block, back_offset + 1),
            remaining: range.count,
        });
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        return self.blocks.iter_mut().flat_map(|block| block.as_mut_slice().iter_mut());
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append at the end, opening a new block once the last one reaches its
    /// default size. Blocks filled by appends keep room for later inserts.
    pub fn push(&mut self, item: T) {
        let len = self.len();
        let needs_block = match self.blocks.last() {
            Some(last) => last.len() >= self.target_size(self.blocks.len() - 1),
            None => true,
        };
        if needs_block {
            let position = self.blocks.len();
            let capacity = self.balancer.new_block_size(position).clamp(1, self.max_size(position));
            self.blocks.push(Block::with_capacity(capacity));
        }
        let last = self.blocks.len() - 1;
        self.blocks[last].push(item);
        self.record_change(last, len + 1);
    }

    pub fn pop(&mut self) -> Option<T> {
        let last = self.len().checked_sub(1)?;
        return self.remove(last).ok();
    }

    /// Insert at `index`, shifting later elements up by one.
    ///
    /// A full target block is split at its midpoint first, so the cost is
    /// bounded by the block size rather than the collection size.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let Some((mut block_index, mut offset)) = self.map.locate_insert(&self.blocks, index) else {
            let capacity = self.balancer.new_block_size(0).clamp(1, self.max_size(0));
            let mut block = Block::with_capacity(capacity);
            block.push(item);
            self.blocks.push(block);
            self.record_change(0, len + 1);
            return Ok(());
        };
        let changed = block_index;

        let block_len = self.blocks[block_index].len();
        if block_len >= self.max_size(block_index) {
            let mid = block_len / 2;
            if mid == 0 {
                // Single-element blocks cannot be halved; the item gets its own.
                let at = block_index + offset;
                self.blocks.insert(at, Block::from_vec(vec![item]));
                self.record_change(changed, len + 1);
                return Ok(());
            }
            let right = self.blocks[block_index].split_off(mid);
            self.blocks.insert(block_index + 1, right);
            profiling::block_split();
            if offset > mid {
                block_index += 1;
                offset -= mid;
            }
        }

        self.blocks[block_index].insert(offset, item);
        self.record_change(changed, len + 1);
        return Ok(());
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let len = self.len();
        let (block_index, offset) = self.locate(index).ok_or(Error::IndexOutOfRange { index, len })?;
        let item = self.blocks[block_index].remove(offset);
        let changed = self.settle(block_index);
        self.record_change(changed, len - 1);
        return Ok(item);
    }

    /// Insert every item of `items` starting at `index`, keeping their order.
    ///
    /// Small batches that fit go straight into the target block. Larger
    /// batches are cut into new blocks sized by the balancer and spliced in
    /// at the insertion point, splitting the target block if needed.
    pub fn insert_range<I>(&mut self, index: usize, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let items: Vec<T> = items.into_iter().collect();
        self.splice_in(index, items);
        return Ok(());
    }

    /// Append every item of `items`.
    pub fn extend_from<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        let len = self.len();
        self.splice_in(len, items);
    }

    /// Remove a logical span, returning the removed elements in order.
    pub fn remove_range(&mut self, range: Range) -> Result<Vec<T>> {
        let spans = self.block_ranges(range)?;
        if spans.is_empty() {
            return Ok(Vec::new());
        }
        let len = self.len();

        let mut removed = Vec::with_capacity(range.count);
        for (block_index, local) in spans.iter() {
            removed.extend(self.blocks[block_index].drain(local.index, local.count));
        }

        let first = spans.start_block;
        let last = first + spans.block_count();
        let survivors: Vec<Block<T>> = self.blocks.drain(first..last).filter(|b| !b.is_empty()).collect();
        let kept = survivors.len();
        self.blocks.splice(first..first, survivors);

        let mut changed = first;
        if kept > 0 {
            changed = changed.min(self.settle(first));
        }
        self.record_change(changed, len - range.count);
        return Ok(removed);
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.map.reset();
    }

    /// Repack every block to the balancer's default size.
    ///
    /// After a rebalance every block except the last holds exactly its
    /// default size, and the last holds between one element and its default
    /// size. Calling it again without an intervening mutation does nothing.
    pub fn rebalance(&mut self) {
        if self.is_balanced() {
            self.map.recompute(&self.blocks);
            return;
        }

        let before = self.blocks.len();
        let mut remaining = self.len();
        let old = std::mem::take(&mut self.blocks);
        let mut items = old.into_iter().flat_map(Block::into_vec);
        let mut position = 0;
        while remaining > 0 {
            let size = self.target_size(position).min(remaining);
            let mut chunk = Vec::with_capacity(size);
            chunk.extend(items.by_ref().take(size));
            self.blocks.push(Block::from_vec(chunk));
            remaining -= size;
            position += 1;
        }
        self.map.recompute(&self.blocks);
        log::debug!(
            "rebalanced {} elements: {} blocks -> {} blocks",
            self.len(),
            before,
            self.blocks.len()
        );
    }

    /// Whether the current layout is exactly what a rebalance would produce.
    pub fn is_balanced(&self) -> bool {
        let count = self.blocks.len();
        for (i, block) in self.blocks.iter().enumerate() {
            let target = self.target_size(i);
            let ok = if i + 1 == count {
                !block.is_empty() && block.len() <= target
            } else {
                block.len() == target
            };
            if !ok {
                return false;
            }
        }
        return true;
    }

    /// Verify the structural invariants, describing the first violation.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let sum: usize = self.blocks.iter().map(|b| b.len()).sum();
        if sum != self.len() {
            return Err(format!("block counts sum to {} but len is {}", sum, self.len()));
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if block.is_empty() {
                return Err(format!("block {} is empty", i));
            }
            if block.len() > self.max_size(i) {
                return Err(format!(
                    "block {} holds {} elements, max is {}",
                    i,
                    block.len(),
                    self.max_size(i)
                ));
            }
        }
        let mut before = 0;
        for i in 0..self.blocks.len() {
            let start = self.map.block_start(&self.blocks, i);
            if start != before {
                return Err(format!("array map start of block {} is {}, expected {}", i, start, before));
            }
            before += self.blocks[i].len();
        }
        return Ok(());
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Tidy up block `block_index` after elements were removed from it.
    /// Returns the lowest block index whose start may have changed.
    fn settle(&mut self, block_index: usize) -> usize {
        if self.blocks[block_index].is_empty() {
            self.blocks.remove(block_index);
            return block_index;
        }
        if self.balancer.is_block_sizes_equal() {
            return block_index;
        }
        let low_water = self.balancer.default_block_size(block_index) / LOW_WATER_DIVISOR;
        if self.blocks[block_index].len() >= low_water {
            return block_index;
        }
        return self.merge_with_smaller_neighbor(block_index).unwrap_or(block_index);
    }

    /// Merge a block with its smaller neighbour if the result fits.
    fn merge_with_smaller_neighbor(&mut self, block_index: usize) -> Option<usize> {
        let left = block_index.checked_sub(1).map(|i| (i, self.blocks[i].len()));
        let right = (block_index + 1 < self.blocks.len()).then(|| (block_index + 1, self.blocks[block_index + 1].len()));
        let neighbor = match (left, right) {
            (Some(l), Some(r)) => {
                if r.1 < l.1 {
                    r.0
                } else {
                    l.0
                }
            }
            (Some(l), None) => l.0,
            (None, Some(r)) => r.0,
            (None, None) => return None,
        };

        let target = neighbor.min(block_index);
        let combined = self.blocks[target].len() + self.blocks[target + 1].len();
        if combined > self.max_size(target) {
            return None;
        }
        let mut absorbed = self.blocks.remove(target + 1);
        self.blocks[target].append(&mut absorbed);
        profiling::block_merge();
        return Some(target);
    }

    /// Place `items` at `index`, which must be at most `len`.
    fn splice_in(&mut self, index: usize, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        let len = self.len();
        let added = items.len();

        if let Some((block_index, offset)) = self.map.locate_insert(&self.blocks, index) {
            if self.blocks[block_index].len() + added <= self.max_size(block_index) {
                self.blocks[block_index].insert_many(offset, items);
                self.record_change(block_index, len + added);
                return;
            }
        }

        let (at, changed) = self.split_for_splice(index);
        let new_blocks = self.partition(at, items);
        self.blocks.splice(at..at, new_blocks);
        self.record_change(changed, len + added);
    }

    /// Prepare a splice point for new blocks at logical `index`.
    /// Returns `(block position to splice at, lowest changed block)`.
    fn split_for_splice(&mut self, index: usize) -> (usize, usize) {
        if index == self.len() {
            let at = self.blocks.len();
            return (at, at);
        }
        let Some((block_index, offset)) = self.locate(index) else {
            return (0, 0);
        };
        if offset == 0 {
            return (block_index, block_index);
        }
        let right = self.blocks[block_index].split_off(offset);
        self.blocks.insert(block_index + 1, right);
        profiling::block_split();
        return (block_index + 1, block_index);
    }

    /// Cut `items` into blocks destined for positions `at, at + 1, ...`.
    ///
    /// Blocks take the balancer's new size; the tail goes into a single
    /// block as soon as it fits under the max size, keeping the block count
    /// minimal.
    fn partition(&self, at: usize, items: Vec<T>) -> Vec<Block<T>> {
        let mut remaining = items.len();
        let mut items = items.into_iter();
        let mut blocks = Vec::new();
        let mut position = at;
        while remaining > 0 {
            let max = self.max_size(position);
            let size = if remaining <= max {
                remaining
            } else {
                self.balancer.new_block_size(position).clamp(1, max)
            };
            let mut chunk = Vec::with_capacity(size);
            chunk.extend(items.by_ref().take(size));
            blocks.push(Block::from_vec(chunk));
            remaining -= size;
            position += 1;
        }
        return blocks;
    }
}

impl<T: Clone> BlockCollection<T> {
    /// Clone a logical span into `dest`, which must be exactly as long.
    pub fn copy_to_slice(&self, range: Range, dest: &mut [T]) -> Result<()> {
        if dest.len() != range.count {
            return Err(Error::RangeOutOfBounds {
                index: 0,
                count: range.count,
                len: dest.len(),
            });
        }
        let spans = self.block_ranges(range)?;
        let mut written = 0;
        for (block_index, local) in spans.iter() {
            let source = &self.blocks[block_index].as_slice()[local.index..local.end()];
            dest[written..written + local.count].clone_from_slice(source);
            written += local.count;
        }
        return Ok(());
    }

    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for block in &self.blocks {
            out.extend_from_slice(block.as_slice());
        }
        return out;
    }
}

impl<T> Default for BlockCollection<T> {
    fn default() -> Self {
        return BlockCollection::new(Arc::new(FixedBalancer::default()));
    }
}

impl<T> IntoIterator for BlockCollection<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        return IntoIter {
            inner: self.blocks.into_iter().flat_map(Block::into_vec as fn(Block<T>) -> Vec<T>),
        };
    }
}

/// Borrowing iterator in logical order.
#[derive(Clone, Debug)]
pub struct Iter<'a, T> {
    blocks: &'a [Block<T>],
    /// Next `(block, offset)` to yield from the front.
    front: (usize, usize),
    /// One past the next `(block, offset)` to yield from the back.
    back: (usize, usize),
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while self.front.1 >= self.blocks[self.front.0].len() {
            self.front = (self.front.0 + 1, 0);
        }
        let item = &self.blocks[self.front.0].as_slice()[self.front.1];
        self.front.1 += 1;
        self.remaining -= 1;
        return Some(item);
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        return (self.remaining, Some(self.remaining));
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while self.back.1 == 0 {
            let previous = self.back.0 - 1;
            self.back = (previous, self.blocks[previous].len());
        }
        self.back.1 -= 1;
        self.remaining -= 1;
        return Some(&self.blocks[self.back.0].as_slice()[self.back.1]);
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

/// Owning iterator in logical order.
pub struct IntoIter<T> {
    inner: std::iter::FlatMap<std::vec::IntoIter<Block<T>>, Vec<T>, fn(Block<T>) -> Vec<T>>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        return self.inner.next();
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        return self.inner.next_back();
    }
}
