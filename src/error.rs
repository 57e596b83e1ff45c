//! Error types for tree queries and invariant checks.

use thiserror::Error;

/// Failure of a single tree operation. The tree is left untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// The key is not present in the tree.
    #[error("key not found")]
    NotFound,

    /// An index was outside `0..len`, either a global rank or a position
    /// inside one key's bag.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// The length it was checked against.
        len: usize,
    },
}

/// A specialized `Result` for tree operations.
pub type Result<T> = core::result::Result<T, Error>;

/// A broken structural invariant, reported by [`OSRBTree::validate`].
///
/// Seeing one of these means the tree itself is corrupt; no public operation
/// should ever produce it.
///
/// [`OSRBTree::validate`]: crate::OSRBTree::validate
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("root node is red")]
    RedRoot,

    #[error("red node has a red child")]
    RedRedEdge,

    #[error("black height {found} differs from {expected} on another path")]
    BlackHeightMismatch { expected: usize, found: usize },

    #[error("cached subtree size {cached} differs from actual size {actual}")]
    SizeMismatch { cached: usize, actual: usize },

    #[error("keys are not strictly increasing in order")]
    KeyOrder,

    #[error("node holds no values")]
    EmptyBag,

    #[error("parent link does not match the tree structure")]
    ParentLink,
}
