//! Example demonstrating nearest-neighbor and range queries with different metrics, and a tree
//! bounded to a sliding window of recent points.

use bucket_kdtree::kdtree::{
    KdTree, KdTreeBuilder, Manhattan, SquaredEuclidean, WeightedSquaredEuclidean,
};

fn main() {
    println!("=== Nearest Points Example ===\n");

    // Example 1: Squared Euclidean distance
    println!("1. Squared Euclidean distance:");
    squared_euclidean_example();

    // Example 2: Manhattan distance
    println!("\n2. Manhattan distance:");
    manhattan_example();

    // Example 3: Weighted axes
    println!("\n3. Weighted squared Euclidean distance:");
    weighted_example();

    // Example 4: Sliding window
    println!("\n4. Sliding window of the five most recent points:");
    sliding_window_example();
}

fn cities() -> Vec<([f64; 2], &'static str)> {
    vec![
        ([-74.0, 40.7], "New York"),
        ([-0.1, 51.5], "London"),
        ([139.7, 35.7], "Tokyo"),
        ([-118.2, 34.1], "Los Angeles"),
        ([2.3, 48.9], "Paris"),
        ([13.4, 52.5], "Berlin"),
    ]
}

fn squared_euclidean_example() {
    let mut tree = KdTree::new(2, None, SquaredEuclidean).unwrap();
    for (point, name) in cities() {
        tree.insert(&point, name).unwrap();
    }

    let query = [0., 50.];
    println!("  Query point: {:?}", query);
    for entry in tree.nearest_neighbor(&query, 3, true).unwrap() {
        println!("  {:>12} at squared distance {:.2}", entry.value, entry.distance);
    }

    let in_range = tree.neighbors_within_range(&query, 15.).unwrap();
    let names: Vec<_> = in_range.iter().map(|entry| *entry.value).collect();
    println!("  Within 15 degrees: {:?}", names);
}

fn manhattan_example() {
    let mut tree = KdTree::new(2, None, Manhattan).unwrap();
    for (point, name) in cities() {
        tree.insert(&point, name).unwrap();
    }

    let query = [0., 50.];
    for entry in tree.nearest_neighbor(&query, 3, true).unwrap() {
        println!("  {:>12} at distance {:.2}", entry.value, entry.distance);
    }
}

fn weighted_example() {
    // Longitude differences count for a tenth of latitude differences
    let metric = WeightedSquaredEuclidean::new(vec![0.1, 1.]);
    let mut tree = KdTreeBuilder::new(2).build(metric).unwrap();
    for (point, name) in cities() {
        tree.insert(&point, name).unwrap();
    }

    let query = [0., 50.];
    for entry in tree.nearest_neighbor(&query, 3, true).unwrap() {
        println!("  {:>12} at weighted distance {:.2}", entry.value, entry.distance);
    }
}

fn sliding_window_example() {
    let mut tree = KdTreeBuilder::new(1)
        .size_limit(Some(5))
        .build(SquaredEuclidean)
        .unwrap();
    for i in 0..20u32 {
        tree.insert(&[f64::from(i)], i).unwrap();
    }

    let mut retained: Vec<u32> = tree
        .nearest_neighbor(&[0.], tree.size(), false)
        .unwrap()
        .iter()
        .map(|entry| *entry.value)
        .collect();
    retained.sort_unstable();
    println!("  Tree size: {}", tree.size());
    println!("  Retained points: {:?}", retained);
}
