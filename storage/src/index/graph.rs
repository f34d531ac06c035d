use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::{Edge, NodeId};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}

impl CirclesError for GraphError {
    fn error_code(&self) -> ErrorCode {
        match self {
            GraphError::UnknownNode(_) => ErrorCode::FailedPrecondition,
        }
    }
}

/// Undirected simple graph of one ego network.
///
/// Nodes iterate in first-insertion order. Self-loops and repeated edges are
/// dropped on insertion.
#[derive(Debug, Clone, Default)]
pub struct EgoGraph {
    order: Vec<NodeId>,
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
    edges: Vec<Edge>,
}

impl EgoGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Self {
        let mut graph = Self::new();
        for (source, target) in edges {
            graph.add_edge(source, target);
        }
        graph
    }

    /// Returns `true` if the node was not present before.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, BTreeSet::new());
        self.order.push(id);
        true
    }

    /// Returns `true` if a new edge was stored.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> bool {
        let edge = Edge::new(source, target);
        if edge.is_self_loop() {
            return false;
        }

        self.add_node(source);
        self.add_node(target);

        let inserted = self
            .adjacency
            .get_mut(&source)
            .map(|neighbors| neighbors.insert(target))
            .unwrap_or(false);
        if !inserted {
            return false;
        }
        if let Some(neighbors) = self.adjacency.get_mut(&target) {
            neighbors.insert(source);
        }
        self.edges.push(edge);
        true
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    /// Each undirected edge once, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn neighbors(&self, id: NodeId) -> Result<&BTreeSet<NodeId>, GraphError> {
        self.adjacency.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn degree(&self, id: NodeId) -> Result<usize, GraphError> {
        self.neighbors(id).map(BTreeSet::len)
    }

    pub fn common_neighbors(&self, a: NodeId, b: NodeId) -> Result<BTreeSet<NodeId>, GraphError> {
        let left = self.neighbors(a)?;
        let right = self.neighbors(b)?;
        Ok(left.intersection(right).copied().collect())
    }

    /// Size of `common_neighbors(a, b)` without materialising the set.
    pub fn common_neighbor_count(&self, a: NodeId, b: NodeId) -> Result<usize, GraphError> {
        let left = self.neighbors(a)?;
        let right = self.neighbors(b)?;
        let (small, large) = if left.len() <= right.len() {
            (left, right)
        } else {
            (right, left)
        };
        Ok(small.iter().filter(|id| large.contains(id)).count())
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
