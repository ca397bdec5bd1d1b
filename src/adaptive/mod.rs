//! Adaptive operation selection.
//!
//! Some operations have several functionally equivalent algorithms whose
//! relative speed depends on the element type and the machine. For each such
//! operation kind there is an ordered table of candidates; the first entry is
//! the fixed default, picked for simplicity rather than speed. The
//! [`Selector`] times every candidate once against a calibration sample,
//! memoizes the fastest per `(operation kind, element type)` and dispatches
//! straight to it from then on.
//!
//! Candidates are plain function pointers invoked directly; there is no
//! lookup by name.

mod samples;
mod selector;

pub use samples::{DefaultSamples, SampleElement, SampleProvider};
pub use selector::{InstantTimer, Selector, Timer};

use smallvec::{SmallVec, smallvec};

use crate::block_collection::BlockCollection;

/// An operation with more than one valid implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Contains,
    IndexOf,
    LastIndexOf,
}

impl OperationKind {
    /// Position in a sample of `len` elements whose value the calibration
    /// searches for: the last element for forward searches, the first for
    /// reverse ones. This is a full-length scan only when that value occurs
    /// nowhere else in the sample; see [`SampleElement`].
    pub fn target_position(&self, len: usize) -> usize {
        match self {
            OperationKind::Contains | OperationKind::IndexOf => return len.saturating_sub(1),
            OperationKind::LastIndexOf => return 0,
        }
    }
}

/// Stable name of a candidate within its operation's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateId(pub &'static str);

/// Signature shared by every search candidate.
pub type SearchFn<T> = fn(&BlockCollection<T>, &T) -> Option<usize>;

/// One implementation of an operation.
pub struct Candidate<T> {
    pub id: CandidateId,
    pub run: SearchFn<T>,
}

impl<T> Candidate<T> {
    pub const fn new(id: &'static str, run: SearchFn<T>) -> Candidate<T> {
        return Candidate {
            id: CandidateId(id),
            run,
        };
    }
}

impl<T> Clone for Candidate<T> {
    fn clone(&self) -> Self {
        return *self;
    }
}

impl<T> Copy for Candidate<T> {}

impl<T> std::fmt::Debug for Candidate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_tuple("Candidate").field(&self.id.0).finish();
    }
}

/// The ordered candidate table for `kind`. Entry 0 is the fixed default.
pub fn standard_candidates<T: PartialEq>(kind: OperationKind) -> SmallVec<[Candidate<T>; 4]> {
    match kind {
        OperationKind::Contains | OperationKind::IndexOf => {
            return smallvec![
                Candidate::new("iterator_scan", iterator_scan::<T>),
                Candidate::new("block_scan", block_scan::<T>),
                Candidate::new("indexed_scan", indexed_scan::<T>),
            ];
        }
        OperationKind::LastIndexOf => {
            return smallvec![
                Candidate::new("iterator_scan_rev", iterator_scan_rev::<T>),
                Candidate::new("block_scan_rev", block_scan_rev::<T>),
                Candidate::new("indexed_scan_rev", indexed_scan_rev::<T>),
            ];
        }
    }
}

/// The fixed default for `kind`, used whenever selection is disabled.
pub fn default_candidate<T: PartialEq>(kind: OperationKind) -> Candidate<T> {
    match kind {
        OperationKind::Contains | OperationKind::IndexOf => {
            return Candidate::new("iterator_scan", iterator_scan::<T>);
        }
        OperationKind::LastIndexOf => return Candidate::new("iterator_scan_rev", iterator_scan_rev::<T>),
    }
}

// =============================================================================
// Candidates
// =============================================================================

/// Generic sequence iteration.
fn iterator_scan<T: PartialEq>(collection: &BlockCollection<T>, item: &T) -> Option<usize> {
    return collection.iter().position(|x| x == item);
}

/// Direct positional scan of each block's slice.
fn block_scan<T: PartialEq>(collection: &BlockCollection<T>, item: &T) -> Option<usize> {
    let mut before = 0;
    for block in collection.blocks() {
        if let Some(offset) = block.as_slice().iter().position(|x| x == item) {
            return Some(before + offset);
        }
        before += block.len();
    }
    return None;
}

/// One resolved lookup per index.
fn indexed_scan<T: PartialEq>(collection: &BlockCollection<T>, item: &T) -> Option<usize> {
    return (0..collection.len()).find(|&i| collection.get(i) == Some(item));
}

fn iterator_scan_rev<T: PartialEq>(collection: &BlockCollection<T>, item: &T) -> Option<usize> {
    return collection.iter().rposition(|x| x == item);
}

fn block_scan_rev<T: PartialEq>(collection: &BlockCollection<T>, item: &T) -> Option<usize> {
    let mut end = collection.len();
    for block in collection.blocks().iter().rev() {
        end -= block.len();
        if let Some(offset) = block.as_slice().iter().rposition(|x| x == item) {
            return Some(end + offset);
        }
    }
    return None;
}

fn indexed_scan_rev<T: PartialEq>(collection: &BlockCollection<T>, item: &T) -> Option<usize> {
    return (0..collection.len()).rev().find(|&i| collection.get(i) == Some(item));
}
