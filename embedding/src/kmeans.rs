use crate::EmbeddingBackend;
use circles_core::model::{CircleId, Partition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use storage::community::{CommunityDetector, DetectionError};
use storage::index::EgoGraph;
use tracing::debug;

/// Circles as k-means clusters of node embeddings.
///
/// Initial centroids come from farthest-point traversal starting at a
/// seeded random node; Lloyd iterations run until assignments settle.
pub struct EmbeddingKMeans {
    backend: Arc<dyn EmbeddingBackend>,
    dimensions: usize,
    clusters: usize,
    seed: u64,
    max_iterations: usize,
}

impl EmbeddingKMeans {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, dimensions: usize, clusters: usize) -> Self {
        Self {
            backend,
            dimensions,
            clusters,
            seed: 0,
            max_iterations: 300,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }
}

impl CommunityDetector for EmbeddingKMeans {
    fn name(&self) -> &str {
        "node2vec-kmeans"
    }

    fn detect(&self, graph: &EgoGraph) -> Result<Partition, DetectionError> {
        let n = graph.node_count();
        if self.clusters == 0 || self.clusters > n {
            return Err(DetectionError::InvalidClusterCount {
                requested: self.clusters,
                nodes: n,
            });
        }

        let table = self
            .backend
            .embed(graph, self.dimensions)
            .map_err(|err| DetectionError::Backend(err.to_string()))?;
        table
            .ensure_covers(graph)
            .map_err(|err| DetectionError::Backend(err.to_string()))?;

        let points: Vec<Vec<f64>> = table
            .iter()
            .map(|(_, v)| v.iter().copied().map(f64::from).collect())
            .collect();
        let labels = lloyd(&points, self.clusters, self.seed, self.max_iterations);

        debug!(
            backend = self.backend.name(),
            clusters = self.clusters,
            nodes = n,
            "Clustered node embeddings"
        );
        Ok(table
            .nodes()
            .iter()
            .zip(labels)
            .map(|(node_id, label)| (*node_id, label as CircleId))
            .collect())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = idx;
        }
    }
    best
}

fn farthest_point_init(points: &[Vec<f64>], k: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = vec![points[rng.random_range(0..points.len())].clone()];
    let mut distances: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let mut far = 0;
        for (idx, distance) in distances.iter().enumerate() {
            if *distance > distances[far] {
                far = idx;
            }
        }
        centroids.push(points[far].clone());
        let newest = &centroids[centroids.len() - 1];
        for (distance, point) in distances.iter_mut().zip(points) {
            *distance = distance.min(squared_distance(point, newest));
        }
    }

    centroids
}

fn lloyd(points: &[Vec<f64>], k: usize, seed: u64, max_iterations: usize) -> Vec<usize> {
    let dims = points[0].len();
    let mut centroids = farthest_point_init(points, k, seed);
    let mut labels: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();

    for _ in 0..max_iterations {
        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (point, label) in points.iter().zip(&labels) {
            counts[*label] += 1;
            for (acc, x) in sums[*label].iter_mut().zip(point) {
                *acc += x;
            }
        }
        for (cluster, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            // Empty clusters keep their previous centroid.
            if count > 0 {
                centroids[cluster] = sum.into_iter().map(|x| x / count as f64).collect();
            }
        }

        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();
        if next == labels {
            break;
        }
        labels = next;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lloyd_separates_obvious_groups() {
        let points = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![5.0, 5.0],
            vec![0.0, 0.1],
            vec![5.1, 5.0],
        ];
        let labels = lloyd(&points, 2, 3, 50);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[3]);
        assert_eq!(labels[2], labels[4]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_farthest_point_init_spreads_centroids() {
        let points = vec![vec![0.0], vec![1.0], vec![10.0]];
        let centroids = farthest_point_init(&points, 2, 11);
        let picked: Vec<f64> = centroids.iter().map(|c| c[0]).collect();
        // Whatever the first pick, the far end of the line is always chosen.
        assert_eq!(picked.len(), 2);
        assert!(picked.contains(&10.0));
    }
}
