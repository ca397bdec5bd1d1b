//! A LIFO stack over [`DistributedList`]; the top is the list's last element.

use std::iter::Rev;

use crate::block_collection::Iter;
use crate::list::DistributedList;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct DistributedStack<T> {
    list: DistributedList<T>,
}

impl<T> DistributedStack<T> {
    pub fn new() -> DistributedStack<T> {
        return DistributedStack {
            list: DistributedList::new(),
        };
    }

    /// Wrap an existing list; its last element becomes the top.
    pub fn from_list(list: DistributedList<T>) -> DistributedStack<T> {
        return DistributedStack { list };
    }

    pub fn into_list(self) -> DistributedList<T> {
        return self.list;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.list.len();
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.list.is_empty();
    }

    pub fn push(&mut self, item: T) {
        self.list.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        return self.list.pop();
    }

    pub fn peek(&self) -> Option<&T> {
        return self.list.last();
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Elements from the top down.
    pub fn iter(&self) -> Rev<Iter<'_, T>> {
        return self.list.iter().rev();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DistributedStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_list().entries(self.iter()).finish();
    }
}

impl<T> Extend<T> for DistributedStack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.list.extend_from(iter);
    }
}

impl<T> FromIterator<T> for DistributedStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        return DistributedStack {
            list: iter.into_iter().collect(),
        };
    }
}
