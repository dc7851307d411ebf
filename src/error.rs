use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdTreeError {
    /// A tree needs at least one axis.
    #[error("Invalid dimensionality {0}: a tree needs at least one axis.")]
    InvalidDimensions(usize),

    /// A point or query had the wrong number of coordinates.
    #[error("Expected {expected} coordinates, got {actual}.")]
    DimensionMismatch {
        /// The tree dimensionality
        expected: usize,
        /// The length of the offending point
        actual: usize,
    },

    /// An interleaved coordinate buffer does not hold a whole number of points.
    #[error("Buffer of {len} coordinates is not a multiple of {dimensions} dimensions.")]
    InterleavedLength {
        /// The tree dimensionality
        dimensions: usize,
        /// The length of the buffer
        len: usize,
    },

    /// A weighted metric carries a weight vector of the wrong length.
    #[error("Metric has weights for {metric} axes but the tree has {tree}.")]
    MetricDimensionMismatch {
        /// Number of weights in the metric
        metric: usize,
        /// The tree dimensionality
        tree: usize,
    },

    /// Buckets must hold at least one point.
    #[error("Bucket size must be at least 1.")]
    InvalidBucketSize,

    /// A size limit must retain at least one point.
    #[error("Size limit must be at least 1.")]
    InvalidSizeLimit,

    /// The oldest point of the eviction window was not found in the leaf it descends to.
    #[error("Oldest point could not be located for eviction.")]
    EvictionMiss,

    /// The node arena is in a state insertion does not expect.
    #[error("Tree structure inconsistent: {0}")]
    Inconsistent(&'static str),
}

pub type Result<T> = std::result::Result<T, KdTreeError>;
