//! Block sizing policies.
//!
//! A balancer is a stateless function of a block's position. The collection
//! asks it how large a freshly created block should be, what size blocks
//! should gravitate to during rebalancing, and when a block must split.
//!
//! Implementations must keep `max >= default >= 0` and `max >= new` for every
//! index. This is a documented precondition and is not checked at runtime.

use std::fmt::Debug;

/// Default target size of a block under [`FixedBalancer::default`].
pub const DEFAULT_BLOCK_SIZE: usize = 512;
/// Default split threshold under [`FixedBalancer::default`].
pub const MAX_BLOCK_SIZE: usize = 1024;

/// A block sizing policy.
pub trait Balancer: Debug + Send + Sync {
    /// Size of a block created at `block_index` by a bulk insert or append.
    fn new_block_size(&self, block_index: usize) -> usize;

    /// Size blocks at `block_index` are driven towards by a rebalance.
    fn default_block_size(&self, block_index: usize) -> usize;

    /// Largest count a block at `block_index` may hold at rest.
    fn max_block_size(&self, block_index: usize) -> usize;

    /// True when all three sizes are the same for every index.
    ///
    /// Uniform policies let the collection skip neighbour merges on removal.
    fn is_block_sizes_equal(&self) -> bool;
}

/// Constant sizes for every block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedBalancer {
    pub new_block_size: usize,
    pub default_block_size: usize,
    pub max_block_size: usize,
}

impl FixedBalancer {
    pub fn new(new_block_size: usize, default_block_size: usize, max_block_size: usize) -> FixedBalancer {
        return FixedBalancer {
            new_block_size,
            default_block_size,
            max_block_size,
        };
    }

    /// A policy where every size equals `size`.
    pub fn uniform(size: usize) -> FixedBalancer {
        return FixedBalancer::new(size, size, size);
    }
}

impl Default for FixedBalancer {
    fn default() -> Self {
        return FixedBalancer::new(DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE);
    }
}

impl Balancer for FixedBalancer {
    fn new_block_size(&self, _block_index: usize) -> usize {
        return self.new_block_size;
    }

    fn default_block_size(&self, _block_index: usize) -> usize {
        return self.default_block_size;
    }

    fn max_block_size(&self, _block_index: usize) -> usize {
        return self.max_block_size;
    }

    fn is_block_sizes_equal(&self) -> bool {
        return self.new_block_size == self.default_block_size
            && self.default_block_size == self.max_block_size;
    }
}

/// Block size doubles every `blocks_per_doubling` blocks, up to a cap.
///
/// Trades memory for fewer blocks on very large sequences: the tail of a
/// long list is stored in large blocks while the head stays fine-grained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowingBalancer {
    pub base_block_size: usize,
    pub blocks_per_doubling: usize,
    pub max_block_size: usize,
}

impl GrowingBalancer {
    pub fn new(base_block_size: usize, blocks_per_doubling: usize, max_block_size: usize) -> GrowingBalancer {
        return GrowingBalancer {
            base_block_size,
            blocks_per_doubling: blocks_per_doubling.max(1),
            max_block_size,
        };
    }

    fn target(&self, block_index: usize) -> usize {
        let doublings = (block_index / self.blocks_per_doubling).min(usize::BITS as usize - 1) as u32;
        let grown = if doublings >= self.base_block_size.leading_zeros() {
            usize::MAX
        } else {
            self.base_block_size << doublings
        };
        // Half the cap so every block still has room to double before it splits.
        return grown.min(self.max_block_size / 2).max(1);
    }
}

impl Default for GrowingBalancer {
    fn default() -> Self {
        return GrowingBalancer::new(64, 8, 16 * 1024);
    }
}

impl Balancer for GrowingBalancer {
    fn new_block_size(&self, block_index: usize) -> usize {
        return self.target(block_index);
    }

    fn default_block_size(&self, block_index: usize) -> usize {
        return self.target(block_index);
    }

    /// Constant, so blocks shifting to a lower position never outgrow it.
    fn max_block_size(&self, _block_index: usize) -> usize {
        return self.max_block_size.max(1);
    }

    fn is_block_sizes_equal(&self) -> bool {
        return false;
    }
}
