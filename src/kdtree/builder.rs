use std::marker::PhantomData;

use crate::error::{KdTreeError, Result};
use crate::kdtree::index::KdTree;
use crate::kdtree::metric::Metric;
use crate::r#type::IndexableNum;

/// The number of points a fresh leaf holds before it splits.
pub const DEFAULT_BUCKET_SIZE: usize = 24;

/// What [`KdTree::insert`] does when a fault occurs after the point was validated.
///
/// Neither policy rolls back: bounds already extended along the insertion path stay extended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertFaultPolicy {
    /// Log the fault at `warn` level and report success.
    #[default]
    Suppress,
    /// Return the fault to the caller.
    Propagate,
}

/// A builder to create a [`KdTree`].
///
/// ```
/// use bucket_kdtree::kdtree::{KdTreeBuilder, SquaredEuclidean};
///
/// let mut tree = KdTreeBuilder::<f32, &str>::new(2)
///     .bucket_size(8)
///     .size_limit(Some(100))
///     .build(SquaredEuclidean)
///     .unwrap();
///
/// tree.insert(&[1., 1.], "a").unwrap();
/// assert_eq!(tree.size(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct KdTreeBuilder<N: IndexableNum, T> {
    dimensions: usize,
    bucket_size: usize,
    size_limit: Option<usize>,
    fault_policy: InsertFaultPolicy,
    phantom: PhantomData<(N, T)>,
}

impl<N: IndexableNum, T> KdTreeBuilder<N, T> {
    /// Create a new builder for a tree with the provided dimensionality and default settings.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            bucket_size: DEFAULT_BUCKET_SIZE,
            size_limit: None,
            fault_policy: InsertFaultPolicy::default(),
            phantom: PhantomData,
        }
    }

    /// Set the initial leaf capacity.
    pub fn bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Retain at most `size_limit` points, evicting the oldest first.
    pub fn size_limit(mut self, size_limit: Option<usize>) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Choose how insertion faults are reported.
    pub fn fault_policy(mut self, fault_policy: InsertFaultPolicy) -> Self {
        self.fault_policy = fault_policy;
        self
    }

    /// Validate the settings and create an empty tree using `metric`.
    pub fn build<M: Metric<N>>(self, metric: M) -> Result<KdTree<N, T, M>> {
        if self.dimensions == 0 {
            return Err(KdTreeError::InvalidDimensions(self.dimensions));
        }
        if self.bucket_size == 0 {
            return Err(KdTreeError::InvalidBucketSize);
        }
        if self.size_limit == Some(0) {
            return Err(KdTreeError::InvalidSizeLimit);
        }
        if let Some(metric_dims) = metric.dimensions() {
            if metric_dims != self.dimensions {
                return Err(KdTreeError::MetricDimensionMismatch {
                    metric: metric_dims,
                    tree: self.dimensions,
                });
            }
        }

        Ok(KdTree::from_parts(
            self.dimensions,
            self.bucket_size,
            self.size_limit,
            self.fault_policy,
            metric,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kdtree::metric::{SquaredEuclidean, WeightedManhattan};

    #[test]
    fn defaults() {
        let tree = KdTreeBuilder::<f32, u32>::new(3)
            .build(SquaredEuclidean)
            .unwrap();
        assert_eq!(tree.dimensions(), 3);
        assert_eq!(tree.bucket_size(), DEFAULT_BUCKET_SIZE);
        assert_eq!(tree.size_limit(), None);
        assert_eq!(tree.fault_policy(), InsertFaultPolicy::Suppress);
        assert!(tree.is_empty());
        assert!(tree.bounds().is_none());
    }

    #[test]
    fn rejects_invalid_settings() {
        let err = KdTreeBuilder::<f32, u32>::new(0)
            .build(SquaredEuclidean)
            .unwrap_err();
        assert_eq!(err, KdTreeError::InvalidDimensions(0));

        let err = KdTreeBuilder::<f32, u32>::new(2)
            .bucket_size(0)
            .build(SquaredEuclidean)
            .unwrap_err();
        assert_eq!(err, KdTreeError::InvalidBucketSize);

        let err = KdTreeBuilder::<f32, u32>::new(2)
            .size_limit(Some(0))
            .build(SquaredEuclidean)
            .unwrap_err();
        assert_eq!(err, KdTreeError::InvalidSizeLimit);
    }

    #[test]
    fn weights_must_match_dimensions() {
        let err = KdTreeBuilder::<f64, u32>::new(3)
            .build(WeightedManhattan::new(vec![1., 2.]))
            .unwrap_err();
        assert_eq!(
            err,
            KdTreeError::MetricDimensionMismatch { metric: 2, tree: 3 }
        );

        assert!(KdTreeBuilder::<f64, u32>::new(2)
            .build(WeightedManhattan::new(vec![1., 2.]))
            .is_ok());
    }
}
