//! Spans of the logical sequence.
//!
//! [`Range`] is a plain `{index, count}` value. [`MultiBlockRange`] is the same
//! span decomposed into one local sub-range per block it crosses, so bulk
//! operations never have to special-case block boundaries.

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// A contiguous span `[index, index + count)` of the logical sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub index: usize,
    pub count: usize,
}

impl Range {
    #[inline]
    pub const fn new(index: usize, count: usize) -> Range {
        return Range { index, count };
    }

    /// One past the last index covered.
    #[inline]
    pub const fn end(&self) -> usize {
        return self.index + self.count;
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        return self.count == 0;
    }

    #[inline]
    pub const fn contains(&self, index: usize) -> bool {
        return index >= self.index && index < self.end();
    }

    /// Overlap of two spans, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Range) -> Option<Range> {
        let start = self.index.max(other.index);
        let end = self.end().min(other.end());
        if start >= end {
            return None;
        }
        return Some(Range::new(start, end - start));
    }

    /// Check that this span fits inside a sequence of `len` elements.
    pub fn check_within(&self, len: usize) -> Result<()> {
        let fits = matches!(self.index.checked_add(self.count), Some(end) if end <= len);
        if !fits {
            return Err(Error::RangeOutOfBounds {
                index: self.index,
                count: self.count,
                len,
            });
        }
        return Ok(());
    }

    /// Split into exactly `part_count` contiguous, non-overlapping parts.
    ///
    /// The first `part_count - 1` parts each hold `count / part_count`
    /// elements; the last holds the remainder. Intended for fanning read-only
    /// work out to several workers.
    ///
    /// `part_count` must be between 1 and `count` (1 for an empty range).
    pub fn divide(&self, part_count: usize) -> Result<Vec<Range>> {
        if part_count == 0 || part_count > self.count.max(1) {
            return Err(Error::InvalidPartCount { part_count });
        }

        let part_size = self.count / part_count;
        let mut parts = Vec::with_capacity(part_count);
        let mut index = self.index;
        for _ in 0..part_count - 1 {
            parts.push(Range::new(index, part_size));
            index += part_size;
        }
        parts.push(Range::new(index, self.count - part_size * (part_count - 1)));
        return Ok(parts);
    }
}

/// A logical span decomposed into per-block local sub-ranges.
///
/// `ranges[i]` is the local span inside block `start_block + i`. Two values
/// are equal when the start block, the total count and every paired
/// sub-range match in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiBlockRange {
    pub start_block: usize,
    /// Total number of elements covered.
    pub count: usize,
    pub ranges: SmallVec<[Range; 4]>,
}

impl MultiBlockRange {
    pub fn new(start_block: usize) -> MultiBlockRange {
        return MultiBlockRange {
            start_block,
            count: 0,
            ranges: SmallVec::new(),
        };
    }

    /// Append the local span for the next block in order.
    pub fn push(&mut self, local: Range) {
        self.count += local.count;
        self.ranges.push(local);
    }

    /// Number of blocks spanned.
    #[inline]
    pub fn block_count(&self) -> usize {
        return self.ranges.len();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.count == 0;
    }

    /// `(block_index, local_range)` pairs in logical order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, Range)> + '_ {
        let start = self.start_block;
        return self
            .ranges
            .iter()
            .enumerate()
            .map(move |(i, local)| (start + i, *local));
    }
}
