use std::collections::TryReserveError;

use thiserror::Error;

/// Errors reported by [`KdTree`](crate::KdTree) operations.
///
/// Every variant is detected before the tree is modified, so a failed call leaves the
/// tree exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KdTreeError {
    /// A coordinate sequence does not have the tree's dimensionality.
    #[error("dimension mismatch: expected {expected} coordinates, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A flat coordinate buffer cannot be split into whole points.
    #[error("flat buffer of length {len} is not a multiple of {dimensions}")]
    FlatLength { len: usize, dimensions: usize },

    /// A tree was requested with zero dimensions.
    #[error("a kd-tree needs at least one dimension")]
    ZeroDimensions,

    /// Reserving memory for nodes, points or the rebuild buffer failed.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}
