//! Block
//!
//! The atomic unit of storage: a bounded, ordered run of elements holding one
//! contiguous slice of the logical sequence. A block has no sizing policy of
//! its own; the owning collection decides when it splits or merges.

/// A bounded-capacity ordered run of elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block<T> {
    items: Vec<T>,
}

impl<T> Block<T> {
    /// Create an empty block, reserving `capacity_hint` slots up front.
    pub fn with_capacity(capacity_hint: usize) -> Block<T> {
        return Block {
            items: Vec::with_capacity(capacity_hint),
        };
    }

    /// Wrap already-ordered items as a block.
    pub fn from_vec(items: Vec<T>) -> Block<T> {
        return Block { items };
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.items.len();
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.items.is_empty();
    }

    #[inline]
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        return self.items.pop();
    }

    /// Insert at a local offset. `offset` must be `<= len`.
    #[inline]
    pub fn insert(&mut self, offset: usize, item: T) {
        self.items.insert(offset, item);
    }

    /// Insert many items at a local offset, keeping their order.
    pub fn insert_many<I>(&mut self, offset: usize, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.splice(offset..offset, items);
    }

    /// Remove at a local offset. `offset` must be `< len`.
    #[inline]
    pub fn remove(&mut self, offset: usize) -> T {
        return self.items.remove(offset);
    }

    #[inline]
    pub fn get(&self, offset: usize) -> Option<&T> {
        return self.items.get(offset);
    }

    #[inline]
    pub fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        return self.items.get_mut(offset);
    }

    /// Replace the item at a local offset, returning the old one.
    #[inline]
    pub fn set(&mut self, offset: usize, item: T) -> T {
        return std::mem::replace(&mut self.items[offset], item);
    }

    /// Split this block at `offset`, returning everything from `offset` on.
    pub fn split_off(&mut self, offset: usize) -> Block<T> {
        return Block {
            items: self.items.split_off(offset),
        };
    }

    /// Move every item of `other` onto the end of this block.
    pub fn append(&mut self, other: &mut Block<T>) {
        self.items.append(&mut other.items);
    }

    /// Remove a local span, returning the removed items in order.
    pub fn drain(&mut self, offset: usize, count: usize) -> std::vec::Drain<'_, T> {
        return self.items.drain(offset..offset + count);
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        return &self.items;
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        return &mut self.items;
    }

    pub fn into_vec(self) -> Vec<T> {
        return self.items;
    }
}

impl<T> Default for Block<T> {
    fn default() -> Self {
        return Block::from_vec(Vec::new());
    }
}
