//! Error types for distlist.

use thiserror::Error;

use crate::adaptive::OperationKind;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by collection, range and selector operations.
///
/// Every positional error is raised before any mutation takes place, so a
/// failed call always leaves the collection exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A single position is outside its valid domain.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A span `[index, index + count)` does not fit inside the collection.
    #[error("range {index}..+{count} out of bounds for length {len}")]
    RangeOutOfBounds { index: usize, count: usize, len: usize },

    /// `Range::divide` was asked for zero parts or more parts than elements.
    #[error("cannot divide a range into {part_count} parts")]
    InvalidPartCount { part_count: usize },

    /// A required collaborator was not supplied.
    #[error("missing required argument: {name}")]
    MissingArgument { name: &'static str },

    /// An operation kind was resolved with an empty candidate set.
    #[error("no candidates registered for operation {operation:?}")]
    NoCandidates { operation: OperationKind },
}
