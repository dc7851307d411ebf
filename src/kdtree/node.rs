//! Arena nodes of the k-d tree.

use std::sync::Arc;

use crate::kdtree::metric::Metric;
use crate::r#type::IndexableNum;

/// Index of a node inside the tree arena.
pub(crate) type NodeIndex = usize;

/// The root always lives at the start of the arena.
pub(crate) const ROOT: NodeIndex = 0;

/// A stored point with its payload.
///
/// Coordinates are shared with the eviction window, which identifies points by pointer.
#[derive(Debug, Clone)]
pub(crate) struct LeafEntry<N, T> {
    pub(crate) coords: Arc<[N]>,
    pub(crate) value: T,
}

/// A growable bucket of points held by a leaf.
#[derive(Debug, Clone)]
pub(crate) struct Bucket<N, T> {
    pub(crate) entries: Vec<LeafEntry<N, T>>,
    /// Number of points this bucket accepts before it must split or grow.
    pub(crate) capacity: usize,
}

impl<N, T> Bucket<N, T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Double the capacity of a bucket that cannot be split.
    pub(crate) fn grow(&mut self) {
        self.capacity *= 2;
        self.entries
            .reserve(self.capacity.saturating_sub(self.entries.len()));
    }
}

/// Per-axis bounding box of every point ever added to a node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bounds<N> {
    pub(crate) min: Box<[N]>,
    pub(crate) max: Box<[N]>,
}

impl<N: IndexableNum> Bounds<N> {
    fn from_point(point: &[N]) -> Self {
        Self {
            min: point.into(),
            max: point.into(),
        }
    }

    /// Find the axis with the largest weighted width. NaN widths count as zero and ties go to the
    /// lowest axis.
    pub(crate) fn widest_axis<M: Metric<N>>(&self, metric: &M) -> usize {
        let width_of = |axis: usize| {
            let width = (self.max[axis] - self.min[axis]) * metric.axis_weight(axis);
            if width.is_nan() {
                N::zero()
            } else {
                width
            }
        };

        let mut widest = 0;
        let mut width = width_of(0);
        for axis in 1..self.min.len() {
            let candidate = width_of(axis);
            if candidate > width {
                widest = axis;
                width = candidate;
            }
        }
        widest
    }
}

/// The two shapes a node can take.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind<N, T> {
    Leaf(Bucket<N, T>),
    Stem {
        axis: usize,
        split: N,
        left: NodeIndex,
        right: NodeIndex,
    },
}

/// A node in the tree arena.
#[derive(Debug, Clone)]
pub(crate) struct Node<N, T> {
    pub(crate) parent: Option<NodeIndex>,
    /// Number of points currently stored below this node.
    pub(crate) len: usize,
    /// `None` until the first point is added.
    pub(crate) bounds: Option<Bounds<N>>,
    /// True while every point ever added had identical, NaN-free coordinates.
    pub(crate) singularity: bool,
    pub(crate) kind: NodeKind<N, T>,
}

impl<N: IndexableNum, T> Node<N, T> {
    pub(crate) fn leaf(parent: Option<NodeIndex>, capacity: usize) -> Self {
        Self {
            parent,
            len: 0,
            bounds: None,
            singularity: true,
            kind: NodeKind::Leaf(Bucket::with_capacity(capacity)),
        }
    }

    /// Extend the bounds of this node to include `point`.
    ///
    /// The first point initializes the box. Afterwards an axis is widened when the coordinate falls
    /// outside of it, and poisoned with NaN when the coordinate is NaN. Either clears `singularity`.
    pub(crate) fn extend_bounds(&mut self, point: &[N]) {
        if self.bounds.is_none() {
            self.bounds = Some(Bounds::from_point(point));
            if point.iter().any(|value| value.is_nan()) {
                self.singularity = false;
            }
            return;
        }

        if let Some(bounds) = &mut self.bounds {
            for (axis, &value) in point.iter().enumerate() {
                if value.is_nan() {
                    bounds.min[axis] = N::nan();
                    bounds.max[axis] = N::nan();
                    self.singularity = false;
                } else if bounds.min[axis] > value {
                    bounds.min[axis] = value;
                    self.singularity = false;
                } else if bounds.max[axis] < value {
                    bounds.max[axis] = value;
                    self.singularity = false;
                }
            }
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// The side of a split a coordinate belongs on. Used identically by insertion, eviction and
/// queries.
#[inline]
pub(crate) fn goes_right<N: IndexableNum>(point: &[N], axis: usize, split: N) -> bool {
    point[axis] > split
}
