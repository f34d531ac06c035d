//! Community detection backends.
//!
//! Every backend produces a total [`Partition`] of an [`EgoGraph`]; callers
//! never depend on which algorithm ran. Two modularity optimisers ship here:
//!
//! - [`Louvain`]: local moving plus aggregation, repeated until no level
//!   merges anything.
//! - [`Leiden`]: the same loop with a refinement step that splits every
//!   community into its connected components before aggregating, so circles
//!   are always internally connected.
//!
//! Both visit nodes in graph insertion order and break ties towards the
//! node's current community, so results are deterministic.

use crate::index::EgoGraph;
use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::{CircleId, NodeId, Partition};
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
    #[error("cannot create {requested} circles from {nodes} nodes")]
    InvalidClusterCount { requested: usize, nodes: usize },
    #[error("backend failure: {0}")]
    Backend(String),
}

impl CirclesError for DetectionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            DetectionError::InvalidParameter { .. }
            | DetectionError::InvalidClusterCount { .. } => ErrorCode::InvalidArgument,
            DetectionError::Backend(_) => ErrorCode::Internal,
        }
    }
}

/// Anything that assigns every node of a graph to exactly one circle.
pub trait CommunityDetector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, graph: &EgoGraph) -> Result<Partition, DetectionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModularitySettings {
    pub resolution: f64,
    pub max_levels: usize,
    pub max_iterations: usize,
}

impl Default for ModularitySettings {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 10,
            max_iterations: 100,
        }
    }
}

impl ModularitySettings {
    fn validate(&self) -> Result<(), DetectionError> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(DetectionError::InvalidParameter {
                name: "resolution",
                message: format!("must be positive, got {}", self.resolution),
            });
        }
        if self.max_levels == 0 || self.max_iterations == 0 {
            return Err(DetectionError::InvalidParameter {
                name: "max_levels/max_iterations",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Louvain {
    settings: ModularitySettings,
}

impl Louvain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ModularitySettings) -> Self {
        Self { settings }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.settings.resolution = resolution;
        self
    }
}

impl CommunityDetector for Louvain {
    fn name(&self) -> &str {
        "louvain"
    }

    fn detect(&self, graph: &EgoGraph) -> Result<Partition, DetectionError> {
        self.settings.validate()?;
        Ok(optimize_modularity(graph, &self.settings, false))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Leiden {
    settings: ModularitySettings,
}

impl Leiden {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ModularitySettings) -> Self {
        Self { settings }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.settings.resolution = resolution;
        self
    }
}

impl CommunityDetector for Leiden {
    fn name(&self) -> &str {
        "leiden"
    }

    fn detect(&self, graph: &EgoGraph) -> Result<Partition, DetectionError> {
        self.settings.validate()?;
        Ok(optimize_modularity(graph, &self.settings, true))
    }
}

/// Newman modularity of a partition with resolution `γ`.
///
/// Nodes missing from the partition count as singletons. Returns 0.0 for
/// graphs without edges.
pub fn modularity(graph: &EgoGraph, partition: &Partition, resolution: f64) -> f64 {
    let m = graph.edge_count() as f64;
    if m == 0.0 {
        return 0.0;
    }

    let label = |node_id: NodeId| partition.circle_of(node_id).map(|c| (0u8, c as u64));
    let key = |node_id: NodeId| label(node_id).unwrap_or((1, node_id));

    let mut internal: HashMap<(u8, u64), f64> = HashMap::new();
    let mut degree_sum: HashMap<(u8, u64), f64> = HashMap::new();

    for edge in graph.edges() {
        if key(edge.source) == key(edge.target) {
            *internal.entry(key(edge.source)).or_insert(0.0) += 1.0;
        }
    }
    for node_id in graph.nodes() {
        let degree = graph.degree(*node_id).unwrap_or(0) as f64;
        *degree_sum.entry(key(*node_id)).or_insert(0.0) += degree;
    }

    degree_sum
        .iter()
        .map(|(community, total)| {
            let inside = internal.get(community).copied().unwrap_or(0.0);
            inside / m - resolution * (total / (2.0 * m)).powi(2)
        })
        .sum()
}

/// Compact weighted view used while optimising.
struct WeightedGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    degrees: Vec<f64>,
    /// Sum of all degrees (2m).
    total: f64,
}

impl WeightedGraph {
    fn from_ego(graph: &EgoGraph) -> Self {
        let index: HashMap<NodeId, usize> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();

        let mut adjacency = vec![Vec::new(); graph.node_count()];
        for edge in graph.edges() {
            let (a, b) = (index[&edge.source], index[&edge.target]);
            adjacency[a].push((b, 1.0));
            adjacency[b].push((a, 1.0));
        }

        let degrees: Vec<f64> = adjacency
            .iter()
            .map(|neighbors| neighbors.iter().map(|(_, w)| w).sum())
            .collect();
        let total = degrees.iter().sum();

        Self {
            adjacency,
            degrees,
            total,
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Collapse every community into one node. Internal weight only shows
    /// up in the degrees, which is all the modularity gain needs.
    fn aggregate(&self, communities: &[usize], count: usize) -> Self {
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut degrees = vec![0.0; count];

        for (node, neighbors) in self.adjacency.iter().enumerate() {
            let from = communities[node];
            degrees[from] += self.degrees[node];
            for (neighbor, weight) in neighbors {
                let to = communities[*neighbor];
                if from != to {
                    *links[from].entry(to).or_insert(0.0) += weight;
                }
            }
        }

        Self {
            adjacency: links.into_iter().map(|m| m.into_iter().collect()).collect(),
            degrees,
            total: self.total,
        }
    }
}

fn optimize_modularity(graph: &EgoGraph, settings: &ModularitySettings, refine: bool) -> Partition {
    let mut current = WeightedGraph::from_ego(graph);
    // Community of every original node, indexed like `graph.nodes()`.
    let mut membership: Vec<usize> = (0..graph.node_count()).collect();

    if current.total > f64::EPSILON {
        for level in 0..settings.max_levels {
            let mut communities = local_moving(&current, settings);
            if refine {
                communities = split_disconnected(&current, &communities);
            }
            let count = relabel(&mut communities);
            debug!(level, nodes = current.len(), communities = count, "Modularity level done");

            for community in membership.iter_mut() {
                *community = communities[*community];
            }
            if count == current.len() {
                break;
            }
            current = current.aggregate(&communities, count);
        }
    }

    relabel(&mut membership);
    graph
        .nodes()
        .iter()
        .zip(membership)
        .map(|(node_id, community)| (*node_id, community as CircleId))
        .collect()
}

fn local_moving(graph: &WeightedGraph, settings: &ModularitySettings) -> Vec<usize> {
    let n = graph.len();
    let mut community: Vec<usize> = (0..n).collect();
    let mut totals: Vec<f64> = graph.degrees.clone();
    let mut links_to: HashMap<usize, f64> = HashMap::new();

    for _ in 0..settings.max_iterations {
        let mut moved = false;

        for node in 0..n {
            let k_i = graph.degrees[node];
            if k_i <= f64::EPSILON {
                continue;
            }
            let current = community[node];
            totals[current] -= k_i;

            links_to.clear();
            for (neighbor, weight) in &graph.adjacency[node] {
                *links_to.entry(community[*neighbor]).or_insert(0.0) += weight;
            }

            let gain = |candidate: usize, k_in: f64| {
                k_in - settings.resolution * totals[candidate] * k_i / graph.total
            };

            let mut best = current;
            let mut best_gain = gain(current, links_to.get(&current).copied().unwrap_or(0.0));

            let mut candidates: Vec<(usize, f64)> =
                links_to.iter().map(|(c, w)| (*c, *w)).collect();
            candidates.sort_unstable_by_key(|(c, _)| *c);
            for (candidate, k_in) in candidates {
                let score = gain(candidate, k_in);
                if score > best_gain + 1e-12 {
                    best_gain = score;
                    best = candidate;
                }
            }

            totals[best] += k_i;
            if best != current {
                community[node] = best;
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }

    community
}

/// Give every connected piece of every community its own label.
fn split_disconnected(graph: &WeightedGraph, communities: &[usize]) -> Vec<usize> {
    let n = graph.len();
    let mut refined = vec![usize::MAX; n];
    let mut next = 0usize;
    let mut queue = VecDeque::new();

    for start in 0..n {
        if refined[start] != usize::MAX {
            continue;
        }
        refined[start] = next;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for (neighbor, _) in &graph.adjacency[node] {
                if refined[*neighbor] == usize::MAX
                    && communities[*neighbor] == communities[start]
                {
                    refined[*neighbor] = next;
                    queue.push_back(*neighbor);
                }
            }
        }
        next += 1;
    }

    refined
}

/// Renumber labels to `0..count` in order of first appearance.
fn relabel(labels: &mut [usize]) -> usize {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    for label in labels.iter_mut() {
        let next = mapping.len();
        *label = *mapping.entry(*label).or_insert(next);
    }
    mapping.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> EgoGraph {
        EgoGraph::from_edges([(1, 2), (2, 3), (1, 3), (10, 11), (11, 12), (10, 12), (3, 10)])
    }

    #[test]
    fn test_relabel_first_appearance() {
        let mut labels = vec![7, 7, 3, 9, 3];
        assert_eq!(relabel(&mut labels), 3);
        assert_eq!(labels, vec![0, 0, 1, 2, 1]);
    }

    #[test]
    fn test_split_disconnected() {
        // 0-1   2-3, all labelled 0.
        let graph = WeightedGraph {
            adjacency: vec![vec![(1, 1.0)], vec![(0, 1.0)], vec![(3, 1.0)], vec![(2, 1.0)]],
            degrees: vec![1.0; 4],
            total: 4.0,
        };
        let refined = split_disconnected(&graph, &[0, 0, 0, 0]);
        assert_eq!(refined, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_louvain_separates_triangles() {
        let graph = two_triangles();
        let partition = Louvain::new().detect(&graph).unwrap();

        assert_eq!(partition.len(), 6);
        assert_eq!(partition.circle_of(1), partition.circle_of(3));
        assert_eq!(partition.circle_of(10), partition.circle_of(12));
        assert_ne!(partition.circle_of(1), partition.circle_of(10));
        assert_eq!(partition.circle_of(1), Some(0));
    }

    #[test]
    fn test_modularity_of_good_split_beats_singletons() {
        let graph = two_triangles();
        let split: Partition = [(1, 0), (2, 0), (3, 0), (10, 1), (11, 1), (12, 1)]
            .into_iter()
            .collect();
        let singletons = Partition::new();

        let good = modularity(&graph, &split, 1.0);
        assert!((good - (6.0 / 7.0 - 2.0 * (7.0f64 / 14.0).powi(2))).abs() < 1e-12);
        assert!(good > modularity(&graph, &singletons, 1.0));
    }

    #[test]
    fn test_invalid_resolution() {
        let err = Leiden::new()
            .with_resolution(0.0)
            .detect(&two_triangles())
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidArgument);
    }
}
