use crate::index::EgoGraph;
use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::{CircleId, NodeId, Partition};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("partition is missing {} graph node(s), first {:?}", .missing.len(), .missing.first())]
    IncompletePartition { missing: Vec<NodeId> },
    #[error("partition assigns unknown node {0}")]
    UnknownNode(NodeId),
}

impl CirclesError for PartitionError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::FailedPrecondition
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleGroup {
    pub id: CircleId,
    pub members: Vec<NodeId>,
}

impl CircleGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Circles keyed by id, in order of first appearance in the partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleGroups {
    groups: Vec<CircleGroup>,
    by_id: HashMap<CircleId, usize>,
    membership: HashMap<NodeId, CircleId>,
}

impl CircleGroups {
    pub fn get(&self, circle_id: CircleId) -> Option<&CircleGroup> {
        self.by_id.get(&circle_id).map(|&pos| &self.groups[pos])
    }

    pub fn circle_of(&self, node_id: NodeId) -> Option<CircleId> {
        self.membership.get(&node_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CircleGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Circle ids, ascending.
    pub fn circle_ids(&self) -> Vec<CircleId> {
        let mut ids: Vec<CircleId> = self.groups.iter().map(|g| g.id).collect();
        ids.sort_unstable();
        ids
    }

    /// `(circle_id, size)` by size descending, ties by ascending id.
    pub fn sizes(&self) -> Vec<(CircleId, usize)> {
        let mut sizes: Vec<(CircleId, usize)> =
            self.groups.iter().map(|g| (g.id, g.len())).collect();
        sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sizes
    }
}

/// Group a partition by circle id and check it covers the graph exactly.
pub fn build_circles(
    graph: &EgoGraph,
    partition: &Partition,
) -> Result<CircleGroups, PartitionError> {
    let mut groups: Vec<CircleGroup> = Vec::new();
    let mut by_id: HashMap<CircleId, usize> = HashMap::new();
    let mut membership = HashMap::with_capacity(partition.len());

    for (node_id, circle_id) in partition.iter() {
        if !graph.contains(node_id) {
            return Err(PartitionError::UnknownNode(node_id));
        }
        let pos = *by_id.entry(circle_id).or_insert_with(|| {
            groups.push(CircleGroup {
                id: circle_id,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[pos].members.push(node_id);
        membership.insert(node_id, circle_id);
    }

    let missing: Vec<NodeId> = graph
        .nodes()
        .iter()
        .copied()
        .filter(|id| !membership.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(PartitionError::IncompletePartition { missing });
    }

    Ok(CircleGroups {
        groups,
        by_id,
        membership,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> EgoGraph {
        EgoGraph::from_edges([(1, 2), (1, 3), (2, 3), (3, 4), (4, 5)])
    }

    #[test]
    fn test_groups_follow_partition_order() {
        let partition: Partition = [(4, 9), (1, 0), (5, 9), (2, 0), (3, 0)].into_iter().collect();
        let circles = build_circles(&sample_graph(), &partition).unwrap();

        let order: Vec<_> = circles.iter().map(|g| g.id).collect();
        assert_eq!(order, vec![9, 0]);
        assert_eq!(circles.get(9).unwrap().members, vec![4, 5]);
        assert_eq!(circles.get(0).unwrap().members, vec![1, 2, 3]);
        assert_eq!(circles.circle_ids(), vec![0, 9]);
        assert_eq!(circles.sizes(), vec![(0, 3), (9, 2)]);
        assert_eq!(circles.circle_of(5), Some(9));
    }

    #[test]
    fn test_incomplete_partition() {
        let partition: Partition = [(1, 0), (2, 0), (4, 1)].into_iter().collect();
        let err = build_circles(&sample_graph(), &partition).unwrap_err();
        assert_eq!(
            err,
            PartitionError::IncompletePartition {
                missing: vec![3, 5]
            }
        );
    }

    #[test]
    fn test_unknown_node_in_partition() {
        let partition: Partition = [(1, 0), (2, 0), (3, 0), (4, 1), (5, 1), (6, 1)]
            .into_iter()
            .collect();
        let err = build_circles(&sample_graph(), &partition).unwrap_err();
        assert_eq!(err, PartitionError::UnknownNode(6));
    }

    #[test]
    fn test_build_is_idempotent() {
        let partition: Partition = [(1, 0), (2, 0), (3, 0), (4, 1), (5, 1)].into_iter().collect();
        let graph = sample_graph();
        let first = build_circles(&graph, &partition).unwrap();
        let second = build_circles(&graph, &partition).unwrap();
        assert_eq!(first, second);
        let firsts: Vec<_> = first.iter().cloned().collect();
        let seconds: Vec<_> = second.iter().cloned().collect();
        assert_eq!(firsts, seconds);
    }
}
