//! Configuration structures for distlist.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::balancer::{Balancer, DEFAULT_BLOCK_SIZE, FixedBalancer, GrowingBalancer, MAX_BLOCK_SIZE};
use crate::error::{Error, Result};

/// Which sizing policy a collection is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalancerConfig {
    /// Constant sizes for every block.
    Fixed {
        new_block_size: usize,
        default_block_size: usize,
        max_block_size: usize,
    },
    /// Block size doubles every `blocks_per_doubling` blocks.
    Growing {
        base_block_size: usize,
        blocks_per_doubling: usize,
        max_block_size: usize,
    },
    /// A caller-supplied policy object; see [`ListBuilder::balancer`](crate::ListBuilder::balancer).
    Custom,
}

impl BalancerConfig {
    /// Instantiate the policy. `Custom` has nothing to build from and fails.
    pub fn build(&self) -> Result<Arc<dyn Balancer>> {
        match *self {
            BalancerConfig::Fixed {
                new_block_size,
                default_block_size,
                max_block_size,
            } => {
                return Ok(Arc::new(FixedBalancer::new(
                    new_block_size,
                    default_block_size,
                    max_block_size,
                )));
            }
            BalancerConfig::Growing {
                base_block_size,
                blocks_per_doubling,
                max_block_size,
            } => {
                return Ok(Arc::new(GrowingBalancer::new(
                    base_block_size,
                    blocks_per_doubling,
                    max_block_size,
                )));
            }
            BalancerConfig::Custom => return Err(Error::MissingArgument { name: "balancer" }),
        }
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        return BalancerConfig::Fixed {
            new_block_size: DEFAULT_BLOCK_SIZE,
            default_block_size: DEFAULT_BLOCK_SIZE,
            max_block_size: MAX_BLOCK_SIZE,
        };
    }
}

/// Construction-time settings for a [`DistributedList`](crate::DistributedList).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Block sizing policy.
    pub balancer: BalancerConfig,
    /// Route multi-candidate operations through the adaptive selector.
    pub adaptive_selection: bool,
    /// Elements to reserve block handles for up front.
    pub initial_capacity: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        return ListConfig {
            balancer: BalancerConfig::default(),
            adaptive_selection: true,
            initial_capacity: 0,
        };
    }
}

/// Nominal sample sizes used during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTiers {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl Default for SampleTiers {
    fn default() -> Self {
        return SampleTiers {
            small: 64,
            medium: 4 * 1024,
            large: 64 * 1024,
        };
    }
}

/// Settings for the adaptive operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Timed runs per candidate against the large sample.
    pub repetitions: u32,
    pub sample_tiers: SampleTiers,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        return SelectorConfig {
            repetitions: 100,
            sample_tiers: SampleTiers::default(),
        };
    }
}
