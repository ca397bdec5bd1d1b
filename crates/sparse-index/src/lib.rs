//! Sparse Index
//!
//! A fixed fan-out radix tree mapping integer keys to values. Each branch
//! level consumes four bits of the key, most significant first, so a tree of
//! depth `d` addresses keys `0..16^d`.
//!
//! Structure:
//! - Nodes are either a `Branch` of 16 child handles or a `Leaf` value
//! - All nodes live in one `Vec` arena, addressed by `u32` handle
//! - Freed handles go on a free list and are reused by later inserts
//! - A branch left with no children is freed as soon as it empties
//!
//! Operations:
//! - insert/get/get_mut/remove: O(depth)
//! - iter: keys in ascending order

use thiserror::Error;

pub const FAN_OUT: usize = 16;
const BITS: u32 = 4;

/// Deepest supported tree; keeps the key space within `u64`.
pub const MAX_DEPTH: u32 = 15;

/// Index into the node arena.
pub type Handle = u32;
/// Sentinel for an empty child slot.
const NONE: Handle = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("key {key} out of range for capacity {capacity}")]
    KeyOutOfRange { key: u64, capacity: u64 },

    #[error("depth {depth} must be between 1 and {max}", max = MAX_DEPTH)]
    InvalidDepth { depth: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug)]
enum Node<V> {
    Branch([Handle; FAN_OUT]),
    Leaf(V),
    /// On the free list.
    Vacant,
}

#[derive(Clone, Debug)]
pub struct SparseIndex<V> {
    nodes: Vec<Node<V>>,
    free: Vec<Handle>,
    /// Root branch, or NONE while the index is empty.
    root: Handle,
    depth: u32,
    len: usize,
}

impl<V> SparseIndex<V> {
    pub fn new(depth: u32) -> Result<SparseIndex<V>> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(Error::InvalidDepth { depth });
        }
        return Ok(SparseIndex {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NONE,
            depth,
            len: 0,
        });
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.len;
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        return self.depth;
    }

    /// One past the largest addressable key.
    #[inline]
    pub fn capacity(&self) -> u64 {
        return 1u64 << (BITS * self.depth);
    }

    /// Live nodes in the arena, branches and leaves together.
    pub fn node_count(&self) -> usize {
        return self.nodes.len() - self.free.len();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = NONE;
        self.len = 0;
    }

    #[inline]
    fn check_key(&self, key: u64) -> Result<()> {
        let capacity = self.capacity();
        if key >= capacity {
            return Err(Error::KeyOutOfRange { key, capacity });
        }
        return Ok(());
    }

    /// Child slot selected by `key` at branch `level` (0 is the root).
    #[inline(always)]
    fn slot(&self, key: u64, level: u32) -> usize {
        let shift = BITS * (self.depth - 1 - level);
        return ((key >> shift) as usize) & (FAN_OUT - 1);
    }

    /// Allocate a node, reusing from free list if available.
    fn alloc(&mut self, node: Node<V>) -> Handle {
        if let Some(handle) = self.free.pop() {
            self.nodes[handle as usize] = node;
            return handle;
        }
        let handle = self.nodes.len() as Handle;
        self.nodes.push(node);
        return handle;
    }

    fn release(&mut self, handle: Handle) -> Node<V> {
        self.free.push(handle);
        return std::mem::replace(&mut self.nodes[handle as usize], Node::Vacant);
    }

    #[inline]
    fn child(&self, branch: Handle, slot: usize) -> Handle {
        match &self.nodes[branch as usize] {
            Node::Branch(children) => return children[slot],
            _ => return NONE,
        }
    }

    fn set_child(&mut self, branch: Handle, slot: usize, child: Handle) {
        if let Node::Branch(children) = &mut self.nodes[branch as usize] {
            children[slot] = child;
        }
    }

    /// Handle of the leaf for `key`, if present.
    fn find(&self, key: u64) -> Option<Handle> {
        if key >= self.capacity() || self.root == NONE {
            return None;
        }
        let mut node = self.root;
        for level in 0..self.depth {
            node = self.child(node, self.slot(key, level));
            if node == NONE {
                return None;
            }
        }
        return Some(node);
    }

    /// Store `value` at `key`, returning the value it replaced.
    pub fn insert(&mut self, key: u64, value: V) -> Result<Option<V>> {
        self.check_key(key)?;
        if self.root == NONE {
            self.root = self.alloc(Node::Branch([NONE; FAN_OUT]));
        }

        let mut node = self.root;
        for level in 0..self.depth - 1 {
            let slot = self.slot(key, level);
            let mut child = self.child(node, slot);
            if child == NONE {
                child = self.alloc(Node::Branch([NONE; FAN_OUT]));
                self.set_child(node, slot, child);
            }
            node = child;
        }

        let slot = self.slot(key, self.depth - 1);
        let leaf = self.child(node, slot);
        if leaf == NONE {
            let leaf = self.alloc(Node::Leaf(value));
            self.set_child(node, slot, leaf);
            self.len += 1;
            return Ok(None);
        }
        match std::mem::replace(&mut self.nodes[leaf as usize], Node::Leaf(value)) {
            Node::Leaf(old) => return Ok(Some(old)),
            _ => return Ok(None),
        }
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        let leaf = self.find(key)?;
        match &self.nodes[leaf as usize] {
            Node::Leaf(value) => return Some(value),
            _ => return None,
        }
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut V> {
        let leaf = self.find(key)?;
        match &mut self.nodes[leaf as usize] {
            Node::Leaf(value) => return Some(value),
            _ => return None,
        }
    }

    #[inline]
    pub fn contains_key(&self, key: u64) -> bool {
        return self.find(key).is_some();
    }

    /// Remove the value at `key`. Branches left empty are freed, up to and
    /// including the root.
    pub fn remove(&mut self, key: u64) -> Result<Option<V>> {
        self.check_key(key)?;
        if self.root == NONE {
            return Ok(None);
        }

        let mut path = Vec::with_capacity(self.depth as usize);
        let mut node = self.root;
        for level in 0..self.depth {
            let slot = self.slot(key, level);
            path.push((node, slot));
            node = self.child(node, slot);
            if node == NONE {
                return Ok(None);
            }
        }

        let value = match self.release(node) {
            Node::Leaf(value) => value,
            _ => return Ok(None),
        };
        self.len -= 1;

        let mut reclaimed = 0;
        while let Some((branch, slot)) = path.pop() {
            self.set_child(branch, slot, NONE);
            let empty = match &self.nodes[branch as usize] {
                Node::Branch(children) => children.iter().all(|&c| c == NONE),
                _ => false,
            };
            if !empty {
                break;
            }
            self.release(branch);
            reclaimed += 1;
            if branch == self.root {
                self.root = NONE;
            }
        }
        if reclaimed > 0 {
            log::trace!("reclaimed {} empty branches removing key {}", reclaimed, key);
        }
        return Ok(Some(value));
    }

    /// `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut stack = Vec::with_capacity(self.depth as usize);
        if self.root != NONE {
            stack.push(Frame {
                branch: self.root,
                prefix: 0,
                slot: 0,
            });
        }
        return Iter { index: self, stack };
    }
}

impl<'a, V> IntoIterator for &'a SparseIndex<V> {
    type Item = (u64, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        return self.iter();
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    branch: Handle,
    /// Key bits chosen above this branch.
    prefix: u64,
    /// Next child slot to visit.
    slot: usize,
}

pub struct Iter<'a, V> {
    index: &'a SparseIndex<V>,
    stack: Vec<Frame>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            if frame.slot == FAN_OUT {
                self.stack.pop();
                continue;
            }
            let Frame { branch, prefix, slot } = *frame;
            frame.slot += 1;

            let child = self.index.child(branch, slot);
            if child == NONE {
                continue;
            }
            let key = (prefix << BITS) | slot as u64;
            match &self.index.nodes[child as usize] {
                Node::Leaf(value) => return Some((key, value)),
                Node::Branch(_) => self.stack.push(Frame {
                    branch: child,
                    prefix: key,
                    slot: 0,
                }),
                Node::Vacant => {}
            }
        }
        return None;
    }
}
