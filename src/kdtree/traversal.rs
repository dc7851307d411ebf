//! Backtracking traversal shared by nearest-neighbor and range queries.
//!
//! The per-node visitation state lives in a stack owned by the traversal, not in the nodes, so any
//! number of queries can walk the same tree at once.

use tinyvec::TinyVec;

use crate::kdtree::heap::Collector;
use crate::kdtree::metric::Metric;
use crate::kdtree::node::{goes_right, LeafEntry, Node, NodeIndex, NodeKind, ROOT};
use crate::r#type::IndexableNum;

/// How much of a stem's subtree a traversal has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum VisitState {
    #[default]
    Unvisited,
    LeftVisited,
    RightVisited,
    AllVisited,
}

#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    node: NodeIndex,
    state: VisitState,
}

impl Frame {
    fn new(node: NodeIndex) -> Self {
        Self {
            node,
            state: VisitState::Unvisited,
        }
    }
}

/// Walk the tree rooted at [`ROOT`], feeding every candidate that may be within the collector's
/// threshold into `collector`.
///
/// Stems are first descended on the query's side of the split. The other side is only entered if
/// it holds points and its bounding box may contain something closer than the current threshold.
pub(crate) fn search<'a, N, T, M, C>(
    nodes: &'a [Node<N, T>],
    metric: &M,
    query: &[N],
    collector: &mut C,
) where
    N: IndexableNum,
    M: Metric<N>,
    C: Collector<'a, N, T>,
{
    if nodes.is_empty() {
        return;
    }

    // Use TinyVec to avoid heap allocations for typical depths
    let mut stack: TinyVec<[Frame; 32]> = TinyVec::new();
    stack.push(Frame::new(ROOT));

    while let Some(frame) = stack.last_mut() {
        let node = &nodes[frame.node];

        let (axis, split, left, right) = match &node.kind {
            NodeKind::Leaf(bucket) => {
                scan_leaf(node, bucket.entries.as_slice(), metric, query, collector);
                stack.pop();
                continue;
            }
            NodeKind::Stem {
                axis,
                split,
                left,
                right,
            } => (*axis, *split, *left, *right),
        };

        let (next, state) = match frame.state {
            VisitState::Unvisited => {
                if goes_right(query, axis, split) {
                    (right, VisitState::RightVisited)
                } else {
                    (left, VisitState::LeftVisited)
                }
            }
            VisitState::LeftVisited => (right, VisitState::AllVisited),
            VisitState::RightVisited => (left, VisitState::AllVisited),
            VisitState::AllVisited => {
                stack.pop();
                continue;
            }
        };
        frame.state = state;

        // The near side is always worth a look. The far side is checked against its bounds.
        if state == VisitState::AllVisited && !worth_visiting(&nodes[next], metric, query, collector)
        {
            continue;
        }

        stack.push(Frame::new(next));
    }
}

fn worth_visiting<'a, N, T, M, C>(node: &Node<N, T>, metric: &M, query: &[N], collector: &C) -> bool
where
    N: IndexableNum,
    M: Metric<N>,
    C: Collector<'a, N, T>,
{
    if node.len == 0 {
        return false;
    }
    if node.singularity {
        return true;
    }
    match &node.bounds {
        Some(bounds) => {
            metric.region_distance(query, &bounds.min, &bounds.max) <= collector.threshold()
        }
        None => false,
    }
}

fn scan_leaf<'a, N, T, M, C>(
    node: &Node<N, T>,
    entries: &'a [LeafEntry<N, T>],
    metric: &M,
    query: &[N],
    collector: &mut C,
) where
    N: IndexableNum,
    M: Metric<N>,
    C: Collector<'a, N, T>,
{
    let Some(first) = entries.first() else {
        return;
    };

    if node.singularity {
        // Every point shares one location, so one distance covers them all
        let distance = metric.point_distance(&first.coords, query);
        if distance <= collector.threshold() {
            for entry in entries {
                collector.offer(distance, &entry.value);
            }
        }
    } else {
        for entry in entries {
            collector.offer(metric.point_distance(&entry.coords, query), &entry.value);
        }
    }
}
