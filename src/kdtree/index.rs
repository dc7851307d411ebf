use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use crate::error::{KdTreeError, Result};
use crate::kdtree::builder::{InsertFaultPolicy, KdTreeBuilder};
use crate::kdtree::metric::Metric;
use crate::kdtree::node::{goes_right, LeafEntry, Node, NodeIndex, NodeKind, ROOT};
use crate::r#type::IndexableNum;

/// An incrementally built k-d tree over points of a fixed dimensionality.
///
/// Points are bucketed in leaves which split on their widest (metric-weighted) axis once full.
/// Optionally the tree keeps a sliding window of the most recent `size_limit` points, evicting the
/// oldest on overflow.
///
/// Queries take `&self` and keep their traversal state locally, so they may run concurrently with
/// each other. Insertion takes `&mut self`.
///
/// ```
/// use bucket_kdtree::kdtree::{KdTree, SquaredEuclidean};
///
/// let mut tree = KdTree::new(2, None, SquaredEuclidean).unwrap();
/// tree.insert(&[0.0f32, 0.], "A").unwrap();
/// tree.insert(&[1., 1.], "B").unwrap();
/// tree.insert(&[5., 5.], "C").unwrap();
///
/// let nearest = tree.nearest_neighbor(&[0., 0.], 1, false).unwrap();
/// assert_eq!(*nearest[0].value, "A");
/// ```
#[derive(Debug, Clone)]
pub struct KdTree<N: IndexableNum, T, M> {
    pub(crate) dimensions: usize,
    pub(crate) bucket_size: usize,
    pub(crate) size_limit: Option<usize>,
    pub(crate) fault_policy: InsertFaultPolicy,
    pub(crate) metric: M,
    /// Node arena, root at [`ROOT`].
    pub(crate) nodes: Vec<Node<N, T>>,
    /// Coordinates of retained points in insertion order. Only used with a size limit.
    pub(crate) window: VecDeque<Arc<[N]>>,
}

impl<N: IndexableNum, T, M: Metric<N>> KdTree<N, T, M> {
    /// Create an empty tree with the default bucket size and fault policy.
    pub fn new(dimensions: usize, size_limit: Option<usize>, metric: M) -> Result<Self> {
        KdTreeBuilder::new(dimensions)
            .size_limit(size_limit)
            .build(metric)
    }

    pub(crate) fn from_parts(
        dimensions: usize,
        bucket_size: usize,
        size_limit: Option<usize>,
        fault_policy: InsertFaultPolicy,
        metric: M,
    ) -> Self {
        Self {
            dimensions,
            bucket_size,
            size_limit,
            fault_policy,
            metric,
            nodes: vec![Node::leaf(None, bucket_size)],
            window: VecDeque::new(),
        }
    }

    /// The number of coordinates per point.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The maximum number of retained points, if any.
    pub fn size_limit(&self) -> Option<usize> {
        self.size_limit
    }

    /// The initial capacity of a leaf.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// How insertion faults are reported.
    pub fn fault_policy(&self) -> InsertFaultPolicy {
        self.fault_policy
    }

    /// The distance metric of this tree.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// The number of points currently in the tree.
    pub fn size(&self) -> usize {
        self.nodes[ROOT].len
    }

    /// Returns `true` if the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The bounding box `(min, max)` of every point ever inserted.
    ///
    /// Eviction never shrinks bounds, so with a size limit this may be larger than the box of the
    /// retained points.
    pub fn bounds(&self) -> Option<(&[N], &[N])> {
        self.nodes[ROOT]
            .bounds
            .as_ref()
            .map(|bounds| (&*bounds.min, &*bounds.max))
    }

    pub(crate) fn check_dimensions(&self, len: usize) -> Result<()> {
        if len != self.dimensions {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dimensions,
                actual: len,
            });
        }
        Ok(())
    }

    /// Add a point and associated value to the tree.
    ///
    /// A point of the wrong length is always an error and leaves the tree untouched. Faults past
    /// that check are handled according to the tree's [`InsertFaultPolicy`].
    pub fn insert(&mut self, point: &[N], value: T) -> Result<()> {
        self.check_dimensions(point.len())?;

        match self.insert_unchecked(Arc::from(point), value) {
            Err(err) if self.fault_policy == InsertFaultPolicy::Suppress => {
                log::warn!("Suppressed fault while inserting a point: {err}");
                Ok(())
            }
            result => result,
        }
    }

    fn insert_unchecked(&mut self, point: Arc<[N]>, value: T) -> Result<()> {
        let mut cursor = ROOT;

        loop {
            let full_leaf = match &self.nodes[cursor].kind {
                NodeKind::Leaf(bucket) => Some(bucket.is_full()),
                NodeKind::Stem { .. } => None,
            };
            match full_leaf {
                Some(false) => break,
                Some(true) => {
                    if !self.split_leaf(cursor)? {
                        break;
                    }
                }
                None => {}
            }

            // `cursor` is a stem now
            let node = &mut self.nodes[cursor];
            node.len += 1;
            node.extend_bounds(&point);
            cursor = match node.kind {
                NodeKind::Stem {
                    axis,
                    split,
                    left,
                    right,
                } => {
                    if goes_right(&point, axis, split) {
                        right
                    } else {
                        left
                    }
                }
                NodeKind::Leaf(_) => return Err(KdTreeError::Inconsistent("leaf after split")),
            };
        }

        let node = &mut self.nodes[cursor];
        node.extend_bounds(&point);
        node.len += 1;
        match &mut node.kind {
            NodeKind::Leaf(bucket) => bucket.entries.push(LeafEntry {
                coords: point.clone(),
                value,
            }),
            NodeKind::Stem { .. } => return Err(KdTreeError::Inconsistent("stem as insert target")),
        }

        if let Some(size_limit) = self.size_limit {
            self.window.push_back(point);
            if self.size() > size_limit {
                self.evict_oldest()?;
            }
        }

        Ok(())
    }

    /// Split the full leaf at `index` into a stem with two child leaves.
    ///
    /// Returns `false` without splitting when the leaf has no usable width on its widest axis. The
    /// bucket capacity is doubled instead, so the caller can append to the same leaf.
    fn split_leaf(&mut self, index: NodeIndex) -> Result<bool> {
        let child_index = self.nodes.len();
        let node = &mut self.nodes[index];
        let bounds = node
            .bounds
            .as_ref()
            .ok_or(KdTreeError::Inconsistent("full leaf without bounds"))?;

        let axis = bounds.widest_axis(&self.metric);
        let (min, max) = (bounds.min[axis], bounds.max[axis]);

        // Equal bounds, or NaN bounds, leave nothing to split on
        let has_width = max > min;
        if !has_width {
            if let NodeKind::Leaf(bucket) = &mut node.kind {
                bucket.grow();
                log::debug!(
                    "Grew degenerate bucket {} to capacity {}",
                    index,
                    bucket.capacity
                );
            }
            return Ok(false);
        }

        let mut split = (min + max) / (N::one() + N::one());
        // Never split on infinity or NaN
        if split == N::infinity() {
            split = N::max_value();
        } else if split == N::neg_infinity() {
            split = N::min_value();
        } else if split.is_nan() {
            split = N::zero();
        }
        // Rounding can land the midpoint on the upper bound
        if split == max {
            split = min;
        }

        let stem = NodeKind::Stem {
            axis,
            split,
            left: child_index,
            right: child_index + 1,
        };
        let bucket = match mem::replace(&mut node.kind, stem) {
            NodeKind::Leaf(bucket) => bucket,
            NodeKind::Stem { .. } => return Err(KdTreeError::Inconsistent("split of a stem")),
        };

        let capacity = self.bucket_size.max(node.len);
        let mut left = Node::leaf(Some(index), capacity);
        let mut right = Node::leaf(Some(index), capacity);
        for entry in bucket.entries {
            let child = if goes_right(&entry.coords, axis, split) {
                &mut right
            } else {
                &mut left
            };
            child.extend_bounds(&entry.coords);
            child.len += 1;
            if let NodeKind::Leaf(child_bucket) = &mut child.kind {
                child_bucket.entries.push(entry);
            }
        }

        log::trace!(
            "Split node {} on axis {} at {:?} into {} left and {} right",
            index,
            axis,
            split,
            left.len,
            right.len
        );
        self.nodes.push(left);
        self.nodes.push(right);

        Ok(true)
    }

    /// Remove the oldest point of the sliding window.
    ///
    /// Bounds are left as they are; they may over-estimate the region of the retained points.
    fn evict_oldest(&mut self) -> Result<()> {
        let Some(point) = self.window.pop_front() else {
            return Ok(());
        };

        let mut cursor = ROOT;
        while let NodeKind::Stem {
            axis,
            split,
            left,
            right,
        } = self.nodes[cursor].kind
        {
            cursor = if goes_right(&point, axis, split) {
                right
            } else {
                left
            };
        }

        let NodeKind::Leaf(bucket) = &mut self.nodes[cursor].kind else {
            return Err(KdTreeError::Inconsistent("eviction ended on a stem"));
        };
        let position = bucket
            .entries
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.coords, &point))
            .ok_or(KdTreeError::EvictionMiss)?;
        // Vec::remove shifts the tail down, keeping the bucket compact
        bucket.entries.remove(position);

        let mut ancestor = Some(cursor);
        while let Some(index) = ancestor {
            let node = &mut self.nodes[index];
            node.len -= 1;
            ancestor = node.parent;
        }

        log::debug!("Evicted oldest point from leaf {}", cursor);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn nodes(&self) -> &[Node<N, T>] {
        &self.nodes
    }
}
