//! distlist - Segmented in-memory ordered collections.
//!
//! A [`DistributedList`] stores its elements in a sequence of bounded blocks
//! instead of one contiguous allocation, so inserts and removes in the middle
//! cost a block's worth of shifting rather than the whole list's.
//!
//! # Quick Start
//!
//! ```
//! use distlist::{DistributedList, Range};
//!
//! let mut list: DistributedList<u32> = (0..10_000).collect();
//! list.insert(5_000, 42).unwrap();
//! assert_eq!(list[5_000], 42);
//!
//! let removed = list.remove_range(Range::new(0, 100)).unwrap();
//! assert_eq!(removed.len(), 100);
//! assert_eq!(list.len(), 9_901);
//! ```

pub mod adaptive;
pub mod array_map;
pub mod balancer;
pub mod block;
pub mod block_collection;
pub mod config;
pub mod error;
pub mod list;
pub mod profiling;
pub mod range;
pub mod stack;

pub use balancer::{Balancer, FixedBalancer, GrowingBalancer};
pub use block_collection::BlockCollection;
pub use config::{BalancerConfig, ListConfig, SampleTiers, SelectorConfig};
pub use error::{Error, Result};
pub use list::{DistributedList, ListBuilder};
pub use range::{MultiBlockRange, Range};
pub use stack::DistributedStack;
