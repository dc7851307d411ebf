//! Nearest-neighbor and range queries.

use geo_traits::CoordTrait;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::{KdTreeError, Result};
use crate::kdtree::heap::{Entry, RangeCollector, ResultHeap};
use crate::kdtree::index::KdTree;
use crate::kdtree::metric::Metric;
use crate::kdtree::traversal::search;
use crate::r#type::IndexableNum;

impl<N: IndexableNum, T, M: Metric<N>> KdTree<N, T, M> {
    /// Find the `count` points closest to `query`.
    ///
    /// With `sorted`, entries are returned from the farthest to the nearest of the retained
    /// candidates. Otherwise they come in heap order.
    ///
    /// ```
    /// use bucket_kdtree::kdtree::{KdTree, SquaredEuclidean};
    ///
    /// let mut tree = KdTree::new(2, None, SquaredEuclidean).unwrap();
    /// tree.insert(&[0.0f32, 0.], 'a').unwrap();
    /// tree.insert(&[1., 1.], 'b').unwrap();
    /// tree.insert(&[5., 5.], 'c').unwrap();
    ///
    /// let results = tree.nearest_neighbor(&[0., 0.], 2, true).unwrap();
    /// let values: Vec<char> = results.iter().map(|entry| *entry.value).collect();
    /// assert_eq!(values, vec!['b', 'a']);
    /// ```
    pub fn nearest_neighbor(
        &self,
        query: &[N],
        count: usize,
        sorted: bool,
    ) -> Result<Vec<Entry<'_, N, T>>> {
        self.check_dimensions(query.len())?;
        if count == 0 || self.is_empty() {
            return Ok(vec![]);
        }

        let mut heap = ResultHeap::new(count);
        search(&self.nodes, &self.metric, query, &mut heap);

        if sorted {
            Ok(heap.into_sorted_vec())
        } else {
            Ok(heap.into_vec())
        }
    }

    /// Find every point within `radius` of `query`, in no particular order.
    ///
    /// The radius is given in linear units and converted with the metric's
    /// [`DistanceScale`](crate::kdtree::DistanceScale), so for squared Euclidean metrics a point is
    /// accepted when its squared distance is at most `radius²`. Returned distances are in the
    /// metric's scale.
    pub fn neighbors_within_range(&self, query: &[N], radius: N) -> Result<Vec<Entry<'_, N, T>>> {
        self.check_dimensions(query.len())?;
        if self.is_empty() {
            return Ok(vec![]);
        }

        let mut collector = RangeCollector::new(self.metric.scale().threshold(radius));
        search(&self.nodes, &self.metric, query, &mut collector);
        Ok(collector.into_vec())
    }

    /// Add a point given as a coordinate.
    pub fn insert_coord(&mut self, coord: &impl CoordTrait<T = N>, value: T) -> Result<()> {
        let point = coord_to_vec(coord);
        self.insert(&point, value)
    }

    /// Find the `count` points closest to the given coordinate.
    pub fn nearest_neighbor_coord(
        &self,
        coord: &impl CoordTrait<T = N>,
        count: usize,
        sorted: bool,
    ) -> Result<Vec<Entry<'_, N, T>>> {
        self.nearest_neighbor(&coord_to_vec(coord), count, sorted)
    }

    /// Find every point within `radius` of the given coordinate.
    pub fn neighbors_within_range_coord(
        &self,
        coord: &impl CoordTrait<T = N>,
        radius: N,
    ) -> Result<Vec<Entry<'_, N, T>>> {
        self.neighbors_within_range(&coord_to_vec(coord), radius)
    }

    fn check_interleaved(&self, queries: &[N]) -> Result<()> {
        if queries.len() % self.dimensions != 0 {
            return Err(KdTreeError::InterleavedLength {
                dimensions: self.dimensions,
                len: queries.len(),
            });
        }
        Ok(())
    }
}

impl<N, T, M> KdTree<N, T, M>
where
    N: IndexableNum,
    T: Sync,
    M: Metric<N> + Sync,
{
    /// Run [`nearest_neighbor`](Self::nearest_neighbor) for every query in an interleaved
    /// coordinate buffer (`[x0, y0, x1, y1, ...]` for two dimensions).
    ///
    /// With the `rayon` feature the queries run in parallel.
    pub fn nearest_neighbor_batch(
        &self,
        queries: &[N],
        count: usize,
        sorted: bool,
    ) -> Result<Vec<Vec<Entry<'_, N, T>>>> {
        self.check_interleaved(queries)?;

        #[cfg(feature = "rayon")]
        let results = queries
            .par_chunks(self.dimensions)
            .map(|query| self.nearest_neighbor(query, count, sorted))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let results = queries
            .chunks(self.dimensions)
            .map(|query| self.nearest_neighbor(query, count, sorted))
            .collect();

        results
    }

    /// Run [`neighbors_within_range`](Self::neighbors_within_range) for every query in an
    /// interleaved coordinate buffer.
    ///
    /// With the `rayon` feature the queries run in parallel.
    pub fn neighbors_within_range_batch(
        &self,
        queries: &[N],
        radius: N,
    ) -> Result<Vec<Vec<Entry<'_, N, T>>>> {
        self.check_interleaved(queries)?;

        #[cfg(feature = "rayon")]
        let results = queries
            .par_chunks(self.dimensions)
            .map(|query| self.neighbors_within_range(query, radius))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let results = queries
            .chunks(self.dimensions)
            .map(|query| self.neighbors_within_range(query, radius))
            .collect();

        results
    }
}

fn coord_to_vec<N: IndexableNum>(coord: &impl CoordTrait<T = N>) -> Vec<N> {
    (0..coord.dim().size())
        .map(|n| coord.nth_or_panic(n))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kdtree::metric::{Manhattan, SquaredEuclidean};

    fn abc_tree() -> KdTree<f32, &'static str, SquaredEuclidean> {
        let mut tree = KdTree::new(2, None, SquaredEuclidean).unwrap();
        tree.insert(&[0., 0.], "A").unwrap();
        tree.insert(&[1., 1.], "B").unwrap();
        tree.insert(&[5., 5.], "C").unwrap();
        tree
    }

    fn pairs<'a>(entries: &[Entry<'a, f32, &'static str>]) -> Vec<(f32, &'static str)> {
        let mut pairs: Vec<_> = entries.iter().map(|e| (e.distance, *e.value)).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(b.1)));
        pairs
    }

    #[test]
    fn nearest_two_use_squared_distances() {
        let tree = abc_tree();
        let results = tree.nearest_neighbor(&[0., 0.], 2, false).unwrap();
        assert_eq!(pairs(&results), vec![(0., "A"), (2., "B")]);
    }

    #[test]
    fn range_compares_against_squared_radius() {
        let tree = abc_tree();
        // 2.0 <= 1.5² = 2.25, so B is in range
        let results = tree.neighbors_within_range(&[0., 0.], 1.5).unwrap();
        assert_eq!(pairs(&results), vec![(0., "A"), (2., "B")]);

        let results = tree.neighbors_within_range(&[0., 0.], 1.4).unwrap();
        assert_eq!(pairs(&results), vec![(0., "A")]);
    }

    #[test]
    fn linear_metrics_use_the_radius_directly() {
        let mut tree = KdTree::new(2, None, Manhattan).unwrap();
        tree.insert(&[0.0f32, 0.], "A").unwrap();
        tree.insert(&[1., 1.], "B").unwrap();
        let results = tree.neighbors_within_range(&[0., 0.], 1.5).unwrap();
        assert_eq!(pairs(&results), vec![(0., "A")]);
        let results = tree.neighbors_within_range(&[0., 0.], 2.).unwrap();
        assert_eq!(pairs(&results), vec![(0., "A"), (2., "B")]);
    }

    #[test]
    fn sorted_output_is_farthest_first() {
        let tree = abc_tree();
        let results = tree.nearest_neighbor(&[0., 0.], 3, true).unwrap();
        let values: Vec<&str> = results.iter().map(|e| *e.value).collect();
        assert_eq!(values, vec!["C", "B", "A"]);
    }

    #[test]
    fn empty_tree_and_zero_count() {
        let tree: KdTree<f32, u8, SquaredEuclidean> =
            KdTree::new(3, None, SquaredEuclidean).unwrap();
        assert!(tree.nearest_neighbor(&[0., 0., 0.], 4, true).unwrap().is_empty());
        assert!(tree
            .neighbors_within_range(&[0., 0., 0.], 10.)
            .unwrap()
            .is_empty());

        let tree = abc_tree();
        assert!(tree.nearest_neighbor(&[0., 0.], 0, false).unwrap().is_empty());
    }

    #[test]
    fn queries_check_dimensions() {
        let tree = abc_tree();
        assert_eq!(
            tree.nearest_neighbor(&[0.], 1, false).unwrap_err(),
            KdTreeError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(tree.neighbors_within_range(&[0., 0., 0.], 1.).is_err());
        assert!(tree.nearest_neighbor_batch(&[0., 0., 0.], 1, false).is_err());
    }

    #[test]
    fn coordinate_queries() {
        let mut tree = abc_tree();
        tree.insert_coord(&(4.0f32, 4.0f32), "D").unwrap();

        let results = tree.nearest_neighbor_coord(&(5.0f32, 4.0f32), 2, false).unwrap();
        assert_eq!(pairs(&results), vec![(1., "C"), (1., "D")]);

        let results = tree.neighbors_within_range_coord(&(0.5f32, 0.5f32), 1.).unwrap();
        assert_eq!(pairs(&results), vec![(0.5, "A"), (0.5, "B")]);
    }

    #[test]
    fn batch_queries_match_single_queries() {
        let tree = abc_tree();
        let queries = [0.0f32, 0., 5., 5., 2., 2.];

        let batch = tree.nearest_neighbor_batch(&queries, 1, false).unwrap();
        let nearest: Vec<&str> = batch.iter().map(|results| *results[0].value).collect();
        assert_eq!(nearest, vec!["A", "C", "B"]);

        let batch = tree.neighbors_within_range_batch(&queries, 1.5).unwrap();
        let counts: Vec<usize> = batch.iter().map(|results| results.len()).collect();
        assert_eq!(counts, vec![2, 1, 1]);
    }
}
