//! DistributedList
//!
//! The public face of the crate: a `Vec`-like ordered collection stored as a
//! [`BlockCollection`]. Block boundaries are never observable through this
//! type; two lists are equal when their elements are, whatever their layout.
//!
//! `contains`, `index_of` and `last_index_of` have several implementations.
//! With adaptive selection on, the process-wide [`Selector`] calibrates them
//! once per element type and dispatches to the winner.

use std::sync::Arc;

use crate::adaptive::{DefaultSamples, OperationKind, SampleElement, SampleProvider, Selector, default_candidate, standard_candidates};
use crate::balancer::Balancer;
use crate::block_collection::{BlockCollection, IntoIter, Iter};
use crate::config::{BalancerConfig, ListConfig};
use crate::error::{Error, Result};
use crate::range::{MultiBlockRange, Range};

#[derive(Clone)]
pub struct DistributedList<T> {
    inner: BlockCollection<T>,
    config: ListConfig,
}

impl<T> DistributedList<T> {
    /// An empty list with the default configuration.
    pub fn new() -> DistributedList<T> {
        return DistributedList {
            inner: BlockCollection::default(),
            config: ListConfig::default(),
        };
    }

    /// An empty list built from `config`.
    ///
    /// Fails with [`Error::MissingArgument`] for [`BalancerConfig::Custom`];
    /// use [`ListBuilder::balancer`] to supply the policy object.
    pub fn with_config(config: ListConfig) -> Result<DistributedList<T>> {
        let balancer = config.balancer.build()?;
        return Ok(DistributedList {
            inner: BlockCollection::with_capacity(balancer, config.initial_capacity),
            config,
        });
    }

    /// An empty list using a caller-supplied sizing policy.
    pub fn with_balancer(balancer: Arc<dyn Balancer>, adaptive_selection: bool) -> DistributedList<T> {
        return DistributedList {
            inner: BlockCollection::new(balancer),
            config: ListConfig {
                balancer: BalancerConfig::Custom,
                adaptive_selection,
                initial_capacity: 0,
            },
        };
    }

    pub fn config(&self) -> &ListConfig {
        return &self.config;
    }

    #[inline]
    pub fn adaptive_selection(&self) -> bool {
        return self.config.adaptive_selection;
    }

    pub fn set_adaptive_selection(&mut self, enabled: bool) {
        self.config.adaptive_selection = enabled;
    }

    /// The underlying block storage.
    pub fn collection(&self) -> &BlockCollection<T> {
        return &self.inner;
    }

    pub fn balancer(&self) -> &Arc<dyn Balancer> {
        return self.inner.balancer();
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.inner.len();
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.inner.is_empty();
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        return self.inner.get(index);
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        return self.inner.get_mut(index);
    }

    pub fn first(&self) -> Option<&T> {
        return self.inner.get(0);
    }

    pub fn last(&self) -> Option<&T> {
        return self.inner.get(self.len().checked_sub(1)?);
    }

    /// Replace the element at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, item: T) -> Result<T> {
        return self.inner.set(index, item);
    }

    pub fn push(&mut self, item: T) {
        self.inner.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        return self.inner.pop();
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        return self.inner.insert(index, item);
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        return self.inner.remove(index);
    }

    /// Append all of `items` in order.
    pub fn extend_from<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.extend_from(items);
    }

    pub fn insert_range<I>(&mut self, index: usize, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        return self.inner.insert_range(index, items);
    }

    pub fn remove_range(&mut self, range: Range) -> Result<Vec<T>> {
        return self.inner.remove_range(range);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> Iter<'_, T> {
        return self.inner.iter();
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        return self.inner.iter_mut();
    }

    pub fn range_iter(&self, range: Range) -> Result<Iter<'_, T>> {
        return self.inner.range_iter(range);
    }

    /// Split the whole list into `part_count` contiguous iterators, for
    /// handing disjoint read-only work to several threads. Fails with
    /// `InvalidPartCount` for zero parts or more parts than elements.
    pub fn divide_iter(&self, part_count: usize) -> Result<Vec<Iter<'_, T>>> {
        let parts = Range::new(0, self.len()).divide(part_count)?;
        let mut iters = Vec::with_capacity(parts.len());
        for part in parts {
            iters.push(self.inner.range_iter(part)?);
        }
        return Ok(iters);
    }

    pub fn rebalance(&mut self) {
        self.inner.rebalance();
    }

    pub fn block_count(&self) -> usize {
        return self.inner.block_count();
    }

    pub fn block_lens(&self) -> Vec<usize> {
        return self.inner.block_lens();
    }

    pub fn block_ranges(&self, range: Range) -> Result<MultiBlockRange> {
        return self.inner.block_ranges(range);
    }

    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        return self.inner.check_invariants();
    }
}

impl<T: Clone> DistributedList<T> {
    /// A list holding a copy of `items`, with the default configuration.
    pub fn from_slice(items: &[T]) -> DistributedList<T> {
        let mut list = DistributedList::new();
        list.extend_from(items.iter().cloned());
        return list;
    }

    pub fn copy_to_slice(&self, range: Range, dest: &mut [T]) -> Result<()> {
        return self.inner.copy_to_slice(range, dest);
    }

    pub fn to_vec(&self) -> Vec<T> {
        return self.inner.to_vec();
    }
}

// =============================================================================
// Searching
// =============================================================================

impl<T: PartialEq + Clone + 'static> DistributedList<T> {
    /// Run the search `kind` for `item`, calibrating against `samples` if
    /// this is the first adaptive search of its kind for `T`.
    pub fn search_with<P>(&self, kind: OperationKind, item: &T, samples: &P) -> Option<usize>
    where
        P: SampleProvider<T> + ?Sized,
    {
        let candidates = standard_candidates::<T>(kind);
        let candidate = Selector::global()
            .choose(self.config.adaptive_selection, kind, &candidates, samples)
            .unwrap_or_else(|_| default_candidate(kind));
        return (candidate.run)(&self.inner, item);
    }
}

impl<T: SampleElement> DistributedList<T> {
    pub fn contains(&self, item: &T) -> bool {
        return self.search_with(OperationKind::Contains, item, &DefaultSamples).is_some();
    }

    /// Position of the first element equal to `item`.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        return self.search_with(OperationKind::IndexOf, item, &DefaultSamples);
    }

    /// Position of the last element equal to `item`.
    pub fn last_index_of(&self, item: &T) -> Option<usize> {
        return self.search_with(OperationKind::LastIndexOf, item, &DefaultSamples);
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent construction of a [`DistributedList`].
#[derive(Debug, Clone, Default)]
pub struct ListBuilder {
    config: ListConfig,
    balancer: Option<Arc<dyn Balancer>>,
}

impl ListBuilder {
    pub fn new() -> ListBuilder {
        return ListBuilder::default();
    }

    pub fn from_config(config: ListConfig) -> ListBuilder {
        return ListBuilder { config, balancer: None };
    }

    pub fn balancer_config(mut self, balancer: BalancerConfig) -> ListBuilder {
        self.config.balancer = balancer;
        self.balancer = None;
        return self;
    }

    /// Use `balancer` as the sizing policy. Selects [`BalancerConfig::Custom`].
    pub fn balancer(mut self, balancer: Arc<dyn Balancer>) -> ListBuilder {
        self.config.balancer = BalancerConfig::Custom;
        self.balancer = Some(balancer);
        return self;
    }

    pub fn adaptive_selection(mut self, enabled: bool) -> ListBuilder {
        self.config.adaptive_selection = enabled;
        return self;
    }

    pub fn initial_capacity(mut self, capacity: usize) -> ListBuilder {
        self.config.initial_capacity = capacity;
        return self;
    }

    pub fn build<T>(&self) -> Result<DistributedList<T>> {
        let balancer = match self.config.balancer {
            BalancerConfig::Custom => self
                .balancer
                .clone()
                .ok_or(Error::MissingArgument { name: "balancer" })?,
            ref other => other.build()?,
        };
        return Ok(DistributedList {
            inner: BlockCollection::with_capacity(balancer, self.config.initial_capacity),
            config: self.config.clone(),
        });
    }

    /// Build a list and fill it from `items`.
    pub fn build_from<T, I>(&self, items: I) -> Result<DistributedList<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = self.build()?;
        list.extend_from(items);
        return Ok(list);
    }
}

// =============================================================================
// Standard traits
// =============================================================================

impl<T> Default for DistributedList<T> {
    fn default() -> Self {
        return DistributedList::new();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DistributedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_list().entries(self.iter()).finish();
    }
}

impl<T: PartialEq> PartialEq for DistributedList<T> {
    fn eq(&self, other: &Self) -> bool {
        return self.len() == other.len() && self.iter().eq(other.iter());
    }
}

impl<T: Eq> Eq for DistributedList<T> {}

impl<T> std::ops::Index<usize> for DistributedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len();
        match self.get(index) {
            Some(item) => return item,
            None => panic!("index {} out of range for length {}", index, len),
        }
    }
}

impl<T> std::ops::IndexMut<usize> for DistributedList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(item) => return item,
            None => panic!("index {} out of range for length {}", index, len),
        }
    }
}

impl<T> FromIterator<T> for DistributedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = DistributedList::new();
        list.extend_from(iter);
        return list;
    }
}

impl<T> Extend<T> for DistributedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.extend_from(iter);
    }
}

impl<T> IntoIterator for DistributedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        return self.inner.into_iter();
    }
}

impl<'a, T> IntoIterator for &'a DistributedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        return self.iter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::{FixedBalancer, GrowingBalancer};

    fn fixed_list(size: usize) -> DistributedList<u32> {
        return DistributedList::with_balancer(Arc::new(FixedBalancer::uniform(size)), false);
    }

    #[test]
    fn behaves_like_vec() {
        let mut list = fixed_list(4);
        let mut model = Vec::new();
        for i in 0..30u32 {
            let at = (i as usize * 7) % (model.len() + 1);
            list.insert(at, i).unwrap();
            model.insert(at, i);
        }
        assert_eq!(list.to_vec(), model);
        assert_eq!(list.remove(3).unwrap(), model.remove(3));
        assert_eq!(list.pop(), model.pop());
        assert_eq!(list.first(), model.first());
        assert_eq!(list.last(), model.last());
        list.check_invariants().unwrap();
    }

    #[test]
    fn equality_ignores_layout() {
        let a: DistributedList<u32> = (0..20).collect();
        let mut b = fixed_list(3);
        b.extend(0..20);
        assert_ne!(a.block_lens(), b.block_lens());
        assert_eq!(a, b);
        b.push(20);
        assert_ne!(a, b);
    }

    #[test]
    fn index_operators() {
        let mut list = DistributedList::from_slice(&[1, 2, 3]);
        list[1] = 20;
        assert_eq!(list[1], 20);
        assert_eq!(format!("{:?}", list), "[1, 20, 3]");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_past_end_panics() {
        let list = DistributedList::from_slice(&[1, 2, 3]);
        let _ = list[3];
    }

    #[test]
    fn search_without_selection() {
        let mut list = fixed_list(4);
        list.extend_from([5, 1, 5, 2, 5, 3]);
        assert!(list.contains(&2));
        assert!(!list.contains(&9));
        assert_eq!(list.index_of(&5), Some(0));
        assert_eq!(list.last_index_of(&5), Some(4));
        assert_eq!(list.index_of(&9), None);
    }

    #[test]
    fn divide_iter_covers_everything() {
        let list: DistributedList<u32> = (0..103).collect();
        let parts = list.divide_iter(4).unwrap();
        assert_eq!(parts.len(), 4);
        let joined: Vec<u32> = parts.into_iter().flatten().copied().collect();
        assert_eq!(joined, (0..103).collect::<Vec<_>>());
        assert!(list.divide_iter(0).is_err());
        assert_eq!(
            list.divide_iter(usize::MAX).err(),
            Some(Error::InvalidPartCount { part_count: usize::MAX })
        );
    }

    #[test]
    fn builder_custom_requires_policy() {
        let missing = ListBuilder::new()
            .balancer_config(BalancerConfig::Custom)
            .build::<u32>();
        assert_eq!(missing.err(), Some(Error::MissingArgument { name: "balancer" }));

        let list = ListBuilder::new()
            .balancer(Arc::new(GrowingBalancer::new(2, 1, 64)))
            .adaptive_selection(false)
            .build_from(0..100u32)
            .unwrap();
        assert_eq!(list.len(), 100);
        assert_eq!(list.config().balancer, BalancerConfig::Custom);
        list.check_invariants().unwrap();
    }

    #[test]
    fn with_config_uses_balancer_config() {
        let config = ListConfig {
            balancer: BalancerConfig::Fixed {
                new_block_size: 2,
                default_block_size: 2,
                max_block_size: 2,
            },
            adaptive_selection: false,
            initial_capacity: 10,
        };
        let mut list = DistributedList::with_config(config).unwrap();
        list.extend_from(0..7u32);
        assert_eq!(list.block_lens(), vec![2, 2, 2, 1]);
        assert!(DistributedList::<u32>::with_config(ListConfig {
            balancer: BalancerConfig::Custom,
            ..ListConfig::default()
        })
        .is_err());
    }
}
