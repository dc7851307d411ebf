//! Distance metrics for k-d tree queries.
//!
//! A metric measures point-to-point distance and a lower bound on the distance from a point to an
//! axis-aligned box. Weighted metrics also bias the split axis selection during insertion, so the
//! same weights shape both the tree and its distances.
//!
//! Any per-axis term that evaluates to NaN is left out of the sum. Bounds on an axis that has ever
//! seen a NaN coordinate are themselves NaN, which makes that axis contribute nothing to the
//! region distance.

use crate::r#type::IndexableNum;

/// The scale in which a metric reports distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceScale {
    /// Distances are squared, e.g. squared Euclidean.
    Squared,
    /// Distances are linear, e.g. Manhattan.
    Linear,
}

impl DistanceScale {
    /// Convert a query radius into the acceptance threshold for distances in this scale.
    #[inline]
    pub fn threshold<N: IndexableNum>(&self, radius: N) -> N {
        match self {
            DistanceScale::Squared => radius * radius,
            DistanceScale::Linear => radius,
        }
    }
}

/// A trait for calculating distances between points, and between points and bounding boxes.
pub trait Metric<N: IndexableNum> {
    /// Distance between two points of equal length.
    fn point_distance(&self, a: &[N], b: &[N]) -> N;

    /// Lower bound on the distance from `point` to any point inside the box `[min, max]`.
    ///
    /// Returns zero if the point lies inside the box.
    fn region_distance(&self, point: &[N], min: &[N], max: &[N]) -> N;

    /// Multiplier applied to the width of `axis` when choosing the axis to split on.
    #[inline]
    fn axis_weight(&self, _axis: usize) -> N {
        N::one()
    }

    /// The scale of the distances this metric produces.
    fn scale(&self) -> DistanceScale;

    /// The number of axes this metric is configured for, if it carries per-axis state.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}

/// 1D signed offset from a value to a range, zero when inside.
#[inline]
fn axis_offset<N: IndexableNum>(k: N, min: N, max: N) -> N {
    if k > max {
        k - max
    } else if k < min {
        k - min
    } else {
        N::zero()
    }
}

/// Add `term` to `sum` unless it is NaN.
#[inline]
fn accumulate<N: IndexableNum>(sum: N, term: N) -> N {
    if term.is_nan() {
        sum
    } else {
        sum + term
    }
}

/// Unweighted squared Euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl<N: IndexableNum> Metric<N> for SquaredEuclidean {
    #[inline]
    fn point_distance(&self, a: &[N], b: &[N]) -> N {
        a.iter().zip(b).fold(N::zero(), |d, (&x, &y)| {
            let diff = x - y;
            accumulate(d, diff * diff)
        })
    }

    #[inline]
    fn region_distance(&self, point: &[N], min: &[N], max: &[N]) -> N {
        let mut d = N::zero();
        for i in 0..point.len() {
            let diff = axis_offset(point[i], min[i], max[i]);
            d = accumulate(d, diff * diff);
        }
        d
    }

    fn scale(&self) -> DistanceScale {
        DistanceScale::Squared
    }
}

/// Squared Euclidean distance with a weight per axis.
///
/// Each axis offset is multiplied by its weight before squaring.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSquaredEuclidean<N: IndexableNum> {
    weights: Vec<N>,
}

impl<N: IndexableNum> WeightedSquaredEuclidean<N> {
    /// Create a new weighted metric. The number of weights must match the tree dimensionality.
    pub fn new(weights: Vec<N>) -> Self {
        Self { weights }
    }

    /// The per-axis weights.
    pub fn weights(&self) -> &[N] {
        &self.weights
    }
}

impl<N: IndexableNum> Metric<N> for WeightedSquaredEuclidean<N> {
    #[inline]
    fn point_distance(&self, a: &[N], b: &[N]) -> N {
        let mut d = N::zero();
        for i in 0..a.len() {
            let diff = (a[i] - b[i]) * self.weights[i];
            d = accumulate(d, diff * diff);
        }
        d
    }

    #[inline]
    fn region_distance(&self, point: &[N], min: &[N], max: &[N]) -> N {
        let mut d = N::zero();
        for i in 0..point.len() {
            let diff = axis_offset(point[i], min[i], max[i]) * self.weights[i];
            d = accumulate(d, diff * diff);
        }
        d
    }

    #[inline]
    fn axis_weight(&self, axis: usize) -> N {
        self.weights[axis]
    }

    fn scale(&self) -> DistanceScale {
        DistanceScale::Squared
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}

/// Unweighted Manhattan (L1) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl<N: IndexableNum> Metric<N> for Manhattan {
    #[inline]
    fn point_distance(&self, a: &[N], b: &[N]) -> N {
        a.iter()
            .zip(b)
            .fold(N::zero(), |d, (&x, &y)| accumulate(d, (x - y).abs()))
    }

    #[inline]
    fn region_distance(&self, point: &[N], min: &[N], max: &[N]) -> N {
        let mut d = N::zero();
        for i in 0..point.len() {
            d = accumulate(d, axis_offset(point[i], min[i], max[i]).abs());
        }
        d
    }

    fn scale(&self) -> DistanceScale {
        DistanceScale::Linear
    }
}

/// Manhattan distance with a weight per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedManhattan<N: IndexableNum> {
    weights: Vec<N>,
}

impl<N: IndexableNum> WeightedManhattan<N> {
    /// Create a new weighted metric. The number of weights must match the tree dimensionality.
    pub fn new(weights: Vec<N>) -> Self {
        Self { weights }
    }

    /// The per-axis weights.
    pub fn weights(&self) -> &[N] {
        &self.weights
    }
}

impl<N: IndexableNum> Metric<N> for WeightedManhattan<N> {
    #[inline]
    fn point_distance(&self, a: &[N], b: &[N]) -> N {
        let mut d = N::zero();
        for i in 0..a.len() {
            d = accumulate(d, (a[i] - b[i]).abs() * self.weights[i]);
        }
        d
    }

    #[inline]
    fn region_distance(&self, point: &[N], min: &[N], max: &[N]) -> N {
        let mut d = N::zero();
        for i in 0..point.len() {
            let diff = axis_offset(point[i], min[i], max[i]).abs();
            d = accumulate(d, diff * self.weights[i]);
        }
        d
    }

    #[inline]
    fn axis_weight(&self, axis: usize) -> N {
        self.weights[axis]
    }

    fn scale(&self) -> DistanceScale {
        DistanceScale::Linear
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}
