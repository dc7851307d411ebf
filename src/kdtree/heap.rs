//! Collectors that accumulate query candidates.

use crate::r#type::IndexableNum;

/// A query result: the distance to a stored point and a reference to its value.
///
/// The distance is in the metric's own scale, i.e. squared for squared Euclidean metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry<'a, N, T> {
    /// Distance from the query point.
    pub distance: N,
    /// The value stored with the point.
    pub value: &'a T,
}

/// Receives candidates from a traversal and decides how far the traversal still has to look.
pub(crate) trait Collector<'a, N, T> {
    /// Candidates farther than this can be discarded, and regions farther than this pruned.
    fn threshold(&self) -> N;

    /// Offer one candidate.
    fn offer(&mut self, distance: N, value: &'a T);
}

/// A bounded max-heap retaining the `capacity` smallest distances offered.
#[derive(Debug)]
pub(crate) struct ResultHeap<'a, N, T> {
    entries: Vec<Entry<'a, N, T>>,
    capacity: usize,
}

impl<'a, N: IndexableNum, T> ResultHeap<'a, N, T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert a candidate if there is room, or if it beats the current maximum.
    pub(crate) fn add_value(&mut self, distance: N, value: &'a T) {
        if self.entries.len() < self.capacity {
            self.entries.push(Entry { distance, value });
            self.sift_up(self.entries.len() - 1);
        } else if self.capacity > 0 && distance < self.entries[0].distance {
            self.entries[0] = Entry { distance, value };
            self.sift_down(0);
        }
    }

    /// `+inf` until the heap is full, then the largest retained distance.
    #[inline]
    pub(crate) fn max_distance(&self) -> N {
        if self.entries.len() < self.capacity {
            N::infinity()
        } else {
            self.entries
                .first()
                .map_or(N::infinity(), |entry| entry.distance)
        }
    }

    /// Pop the entry with the largest distance.
    pub(crate) fn remove_largest(&mut self) -> Option<Entry<'a, N, T>> {
        if self.entries.is_empty() {
            return None;
        }
        let largest = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(largest)
    }

    /// Drain entries from farthest to nearest.
    pub(crate) fn into_sorted_vec(mut self) -> Vec<Entry<'a, N, T>> {
        let mut sorted = Vec::with_capacity(self.len());
        while let Some(entry) = self.remove_largest() {
            sorted.push(entry);
        }
        sorted
    }

    /// Entries in heap order.
    pub(crate) fn into_vec(self) -> Vec<Entry<'a, N, T>> {
        self.entries
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if self.entries[child].distance > self.entries[parent].distance {
                self.entries.swap(child, parent);
                child = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        let len = self.entries.len();
        loop {
            let mut child = parent * 2 + 1;
            if child >= len {
                break;
            }
            if child + 1 < len && self.entries[child].distance < self.entries[child + 1].distance {
                child += 1;
            }
            if self.entries[parent].distance < self.entries[child].distance {
                self.entries.swap(parent, child);
                parent = child;
            } else {
                break;
            }
        }
    }
}

impl<'a, N: IndexableNum, T> Collector<'a, N, T> for ResultHeap<'a, N, T> {
    #[inline]
    fn threshold(&self) -> N {
        self.max_distance()
    }

    #[inline]
    fn offer(&mut self, distance: N, value: &'a T) {
        self.add_value(distance, value)
    }
}

/// Unbounded collector for every candidate within a fixed threshold.
#[derive(Debug)]
pub(crate) struct RangeCollector<'a, N, T> {
    threshold: N,
    entries: Vec<Entry<'a, N, T>>,
}

impl<'a, N: IndexableNum, T> RangeCollector<'a, N, T> {
    pub(crate) fn new(threshold: N) -> Self {
        Self {
            threshold,
            entries: vec![],
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Entry<'a, N, T>> {
        self.entries
    }
}

impl<'a, N: IndexableNum, T> Collector<'a, N, T> for RangeCollector<'a, N, T> {
    #[inline]
    fn threshold(&self) -> N {
        self.threshold
    }

    #[inline]
    fn offer(&mut self, distance: N, value: &'a T) {
        if distance <= self.threshold {
            self.entries.push(Entry { distance, value });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keeps_the_smallest_distances() {
        let values: Vec<u32> = (0..10).collect();
        let mut heap = ResultHeap::new(3);
        for (i, value) in values.iter().enumerate() {
            // distances 9, 8, ..., 0
            heap.add_value((9 - i) as f32, value);
        }
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.max_distance(), 2.);

        let sorted = heap.into_sorted_vec();
        let distances: Vec<f32> = sorted.iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![2., 1., 0.]);
        let ids: Vec<u32> = sorted.iter().map(|e| *e.value).collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }

    #[test]
    fn max_distance_is_infinite_until_full() {
        let value = ();
        let mut heap = ResultHeap::new(2);
        assert_eq!(heap.max_distance(), f64::INFINITY);
        heap.add_value(5., &value);
        assert_eq!(heap.max_distance(), f64::INFINITY);
        heap.add_value(1., &value);
        assert_eq!(heap.max_distance(), 5.);
    }

    #[test]
    fn ties_with_the_maximum_are_discarded() {
        let (a, b, c) = ("a", "b", "c");
        let mut heap = ResultHeap::new(2);
        heap.add_value(1.0f32, &a);
        heap.add_value(2.0, &b);
        heap.add_value(2.0, &c);
        let values: Vec<&str> = heap.into_sorted_vec().iter().map(|e| *e.value).collect();
        assert_eq!(values, vec!["b", "a"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let value = 1;
        let mut heap = ResultHeap::new(0);
        heap.add_value(1.0f32, &value);
        assert_eq!(heap.len(), 0);
        assert!(heap.remove_largest().is_none());
    }

    #[test]
    fn range_collector_filters_by_threshold() {
        let (a, b) = (1, 2);
        let mut collector = RangeCollector::new(2.25f32);
        collector.offer(2.0, &a);
        collector.offer(2.5, &b);
        assert_eq!(collector.threshold(), 2.25);
        let entries = collector.into_vec();
        assert_eq!(entries.len(), 1);
        assert_eq!(*entries[0].value, 1);
    }
}
