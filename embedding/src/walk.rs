//! node2vec-style embeddings without a training loop.
//!
//! Second-order biased random walks (return parameter `p`, in-out parameter
//! `q`) are turned into vectors by random indexing: every node owns a fixed
//! pseudo-random basis vector, and a node's embedding is the distance-decayed
//! sum of the basis vectors of the nodes it co-occurs with inside the window.
//! Nodes that share walk contexts end up pointing the same way.

use crate::{EmbeddingBackend, EmbeddingBackendError};
use circles_core::config::EmbeddingConfig;
use circles_core::embedding::hashed_basis_vector;
use circles_core::model::NodeId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use storage::index::{EgoGraph, EmbeddingTable};
use tracing::debug;

/// Share of a node's own basis vector mixed into its embedding.
const SELF_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct WalkConfig {
    pub walk_length: usize,
    pub num_walks: usize,
    pub window: usize,
    pub p: f64,
    pub q: f64,
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

impl From<&EmbeddingConfig> for WalkConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            walk_length: config.walk_length,
            num_walks: config.num_walks,
            window: config.window,
            p: config.p,
            q: config.q,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalkEmbedder {
    config: WalkConfig,
}

impl WalkEmbedder {
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    fn validate(&self, dimensions: usize) -> Result<(), EmbeddingBackendError> {
        let invalid = |name: &'static str, message: String| {
            Err(EmbeddingBackendError::InvalidParameter { name, message })
        };
        if dimensions == 0 {
            return invalid("dimensions", "must be positive".into());
        }
        if self.config.walk_length == 0 || self.config.num_walks == 0 {
            return invalid("walk_length/num_walks", "must be positive".into());
        }
        for (name, value) in [("p", self.config.p), ("q", self.config.q)] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(name, format!("must be positive, got {value}"));
            }
        }
        Ok(())
    }

    /// All walks, `num_walks` rounds over a shuffled node order.
    pub fn generate_walks(&self, graph: &EgoGraph) -> Vec<Vec<NodeId>> {
        let neighbors: HashMap<NodeId, Vec<NodeId>> = graph
            .nodes()
            .iter()
            .map(|id| {
                let list = graph
                    .neighbors(*id)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default();
                (*id, list)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut starts: Vec<NodeId> = graph.nodes().to_vec();
        let mut walks = Vec::with_capacity(starts.len() * self.config.num_walks);

        for _ in 0..self.config.num_walks {
            starts.shuffle(&mut rng);
            for start in &starts {
                walks.push(self.walk_from(*start, graph, &neighbors, &mut rng));
            }
        }

        walks
    }

    fn walk_from(
        &self,
        start: NodeId,
        graph: &EgoGraph,
        neighbors: &HashMap<NodeId, Vec<NodeId>>,
        rng: &mut StdRng,
    ) -> Vec<NodeId> {
        let mut walk = Vec::with_capacity(self.config.walk_length);
        walk.push(start);

        while walk.len() < self.config.walk_length {
            let current = walk[walk.len() - 1];
            let options = match neighbors.get(&current) {
                Some(options) if !options.is_empty() => options,
                _ => break,
            };

            let next = if walk.len() == 1 {
                options[rng.random_range(0..options.len())]
            } else {
                let previous = walk[walk.len() - 2];
                let weights: Vec<f64> = options
                    .iter()
                    .map(|candidate| {
                        if *candidate == previous {
                            1.0 / self.config.p
                        } else if graph
                            .neighbors(previous)
                            .map(|set| set.contains(candidate))
                            .unwrap_or(false)
                        {
                            1.0
                        } else {
                            1.0 / self.config.q
                        }
                    })
                    .collect();
                options[sample_weighted(&weights, rng)]
            };
            walk.push(next);
        }

        walk
    }
}

fn sample_weighted(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.random::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        if target < *weight {
            return idx;
        }
        target -= weight;
    }
    weights.len() - 1
}

fn normalize(vector: &mut [f64]) -> bool {
    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm <= f64::EPSILON {
        return false;
    }
    for x in vector.iter_mut() {
        *x /= norm;
    }
    true
}

impl EmbeddingBackend for WalkEmbedder {
    fn name(&self) -> &str {
        "node2vec"
    }

    fn embed(
        &self,
        graph: &EgoGraph,
        dimensions: usize,
    ) -> Result<EmbeddingTable, EmbeddingBackendError> {
        self.validate(dimensions)?;

        let basis: HashMap<NodeId, Vec<f64>> = graph
            .nodes()
            .iter()
            .map(|id| {
                let mut v: Vec<f64> = hashed_basis_vector(*id, self.config.seed, dimensions)
                    .into_iter()
                    .map(f64::from)
                    .collect();
                normalize(&mut v);
                (*id, v)
            })
            .collect();

        let mut context: HashMap<NodeId, Vec<f64>> = graph
            .nodes()
            .iter()
            .map(|id| (*id, vec![0.0; dimensions]))
            .collect();

        let walks = self.generate_walks(graph);
        for walk in &walks {
            for (i, node) in walk.iter().enumerate() {
                let lo = i.saturating_sub(self.config.window);
                let hi = (i + self.config.window).min(walk.len() - 1);
                let Some(target) = context.get_mut(node) else {
                    continue;
                };
                for (j, other) in walk.iter().enumerate().take(hi + 1).skip(lo) {
                    if j == i {
                        continue;
                    }
                    let weight = 1.0 / i.abs_diff(j) as f64;
                    if let Some(other_basis) = basis.get(other) {
                        for (acc, b) in target.iter_mut().zip(other_basis) {
                            *acc += weight * b;
                        }
                    }
                }
            }
        }

        let mut nodes = Vec::with_capacity(graph.node_count());
        let mut vectors = Vec::with_capacity(graph.node_count());
        for id in graph.nodes() {
            let mut vector = context.remove(id).unwrap_or_else(|| vec![0.0; dimensions]);
            let own = &basis[id];
            if normalize(&mut vector) {
                for (x, b) in vector.iter_mut().zip(own) {
                    *x += SELF_WEIGHT * b;
                }
            } else {
                vector.clone_from(own);
            }
            normalize(&mut vector);

            nodes.push(*id);
            vectors.push(vector.into_iter().map(|x| x as f32).collect());
        }

        debug!(
            nodes = nodes.len(),
            walks = walks.len(),
            dimensions,
            "Computed walk embeddings"
        );
        Ok(EmbeddingTable::new(nodes, vectors, dimensions)?)
    }
}
