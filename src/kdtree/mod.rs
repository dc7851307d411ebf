//! An incrementally built, bucketed K-D Tree with pluggable distance metrics.

#![warn(missing_docs)]

mod builder;
mod heap;
mod index;
mod metric;
mod node;
mod query;
mod traversal;

pub use builder::{InsertFaultPolicy, KdTreeBuilder, DEFAULT_BUCKET_SIZE};
pub use heap::Entry;
pub use index::KdTree;
pub use metric::{
    DistanceScale, Manhattan, Metric, SquaredEuclidean, WeightedManhattan,
    WeightedSquaredEuclidean,
};
