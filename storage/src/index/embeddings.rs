use super::graph::EgoGraph;
use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::NodeId;
use std::collections::HashMap;
use thiserror::Error;

/// Guards cosine similarity against zero-norm vectors.
pub const COSINE_EPSILON: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("duplicate node in embedding table: {0}")]
    DuplicateNode(NodeId),
    #[error("embedding for node {node_id} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        node_id: NodeId,
        expected: usize,
        found: usize,
    },
    #[error("node ordering has {nodes} entries but {vectors} vectors were supplied")]
    LengthMismatch { nodes: usize, vectors: usize },
    #[error("embedding table has no vector for graph node {0}")]
    MissingNode(NodeId),
    #[error("embedding for node {node_id} has a non-finite component")]
    NonFiniteComponent { node_id: NodeId },
}

impl CirclesError for EmbeddingError {
    fn error_code(&self) -> ErrorCode {
        match self {
            EmbeddingError::UnknownNode(_) | EmbeddingError::MissingNode(_) => {
                ErrorCode::FailedPrecondition
            }
            EmbeddingError::DuplicateNode(_)
            | EmbeddingError::DimensionMismatch { .. }
            | EmbeddingError::LengthMismatch { .. }
            | EmbeddingError::NonFiniteComponent { .. } => ErrorCode::InvalidArgument,
        }
    }
}

/// Dense node vectors aligned to a fixed node ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    nodes: Vec<NodeId>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
    index: HashMap<NodeId, usize>,
}

impl EmbeddingTable {
    pub fn new(
        nodes: Vec<NodeId>,
        vectors: Vec<Vec<f32>>,
        dimensions: usize,
    ) -> Result<Self, EmbeddingError> {
        if nodes.len() != vectors.len() {
            return Err(EmbeddingError::LengthMismatch {
                nodes: nodes.len(),
                vectors: vectors.len(),
            });
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, (node_id, vector)) in nodes.iter().zip(vectors.iter()).enumerate() {
            if vector.len() != dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    node_id: *node_id,
                    expected: dimensions,
                    found: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(EmbeddingError::NonFiniteComponent { node_id: *node_id });
            }
            if index.insert(*node_id, pos).is_some() {
                return Err(EmbeddingError::DuplicateNode(*node_id));
            }
        }

        Ok(Self {
            nodes,
            vectors,
            dimensions,
            index,
        })
    }

    /// The node ordering the vectors are aligned to.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.index.contains_key(&node_id)
    }

    pub fn position(&self, node_id: NodeId) -> Option<usize> {
        self.index.get(&node_id).copied()
    }

    pub fn vector(&self, node_id: NodeId) -> Result<&[f32], EmbeddingError> {
        self.index
            .get(&node_id)
            .map(|&pos| self.vectors[pos].as_slice())
            .ok_or(EmbeddingError::UnknownNode(node_id))
    }

    /// Checks that the node ordering is a permutation of the graph's nodes.
    pub fn ensure_covers(&self, graph: &EgoGraph) -> Result<(), EmbeddingError> {
        if let Some(missing) = graph.nodes().iter().find(|id| !self.contains(**id)) {
            return Err(EmbeddingError::MissingNode(*missing));
        }
        if let Some(extra) = self.nodes.iter().find(|id| !graph.contains(**id)) {
            return Err(EmbeddingError::UnknownNode(*extra));
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[f32])> + '_ {
        self.nodes
            .iter()
            .copied()
            .zip(self.vectors.iter().map(Vec::as_slice))
    }
}

/// `a·b / (‖a‖·‖b‖ + ε)`, accumulated in `f64`.
///
/// Vectors of different length are compared over their common prefix; the
/// table guarantees equal dimensions for everything it hands out.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt() + COSINE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        let table = EmbeddingTable::new(
            vec![10, 20],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            2,
        )
        .unwrap();

        assert_eq!(table.vector(20).unwrap(), &[0.0, 1.0]);
        assert_eq!(table.position(10), Some(0));
        assert_eq!(table.vector(30).unwrap_err(), EmbeddingError::UnknownNode(30));
    }

    #[test]
    fn test_table_rejects_bad_shapes() {
        let err = EmbeddingTable::new(vec![1, 2], vec![vec![1.0, 0.0]], 2).unwrap_err();
        assert_eq!(err, EmbeddingError::LengthMismatch { nodes: 2, vectors: 1 });

        let err = EmbeddingTable::new(vec![1, 2], vec![vec![1.0, 0.0], vec![1.0]], 2).unwrap_err();
        assert_eq!(
            err,
            EmbeddingError::DimensionMismatch {
                node_id: 2,
                expected: 2,
                found: 1
            }
        );

        let err =
            EmbeddingTable::new(vec![1, 1], vec![vec![1.0, 0.0], vec![0.0, 1.0]], 2).unwrap_err();
        assert_eq!(err, EmbeddingError::DuplicateNode(1));
    }

    #[test]
    fn test_table_rejects_non_finite_components() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = EmbeddingTable::new(vec![1, 4], vec![vec![1.0, 0.0], vec![bad, 0.0]], 2)
                .unwrap_err();
            assert_eq!(err, EmbeddingError::NonFiniteComponent { node_id: 4 });
            assert_eq!(err.error_code(), ErrorCode::InvalidArgument);
        }
    }

    #[test]
    fn test_ensure_covers() {
        let graph = EgoGraph::from_edges([(1, 2)]);
        let full = EmbeddingTable::new(vec![2, 1], vec![vec![1.0], vec![2.0]], 1).unwrap();
        assert!(full.ensure_covers(&graph).is_ok());

        let partial = EmbeddingTable::new(vec![1], vec![vec![1.0]], 1).unwrap();
        assert_eq!(
            partial.ensure_covers(&graph).unwrap_err(),
            EmbeddingError::MissingNode(2)
        );

        let extra =
            EmbeddingTable::new(vec![1, 2, 3], vec![vec![1.0], vec![1.0], vec![1.0]], 1).unwrap();
        assert_eq!(
            extra.ensure_covers(&graph).unwrap_err(),
            EmbeddingError::UnknownNode(3)
        );
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        // Zero vectors stay finite thanks to the epsilon.
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
