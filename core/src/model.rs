use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a person in an ego graph.
pub type NodeId = u64;

/// Identifier of a detected circle. Not required to be contiguous.
pub type CircleId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Assignment of nodes to circles, in the order the assignments were made.
///
/// Re-assigning a node moves it to the new circle without changing its
/// position in the iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    assignments: Vec<(NodeId, CircleId)>,
    positions: HashMap<NodeId, usize>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, node_id: NodeId, circle_id: CircleId) {
        match self.positions.get(&node_id) {
            Some(&pos) => self.assignments[pos].1 = circle_id,
            None => {
                self.positions.insert(node_id, self.assignments.len());
                self.assignments.push((node_id, circle_id));
            }
        }
    }

    pub fn circle_of(&self, node_id: NodeId) -> Option<CircleId> {
        self.positions
            .get(&node_id)
            .map(|&pos| self.assignments[pos].1)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.positions.contains_key(&node_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, CircleId)> + '_ {
        self.assignments.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl FromIterator<(NodeId, CircleId)> for Partition {
    fn from_iter<T: IntoIterator<Item = (NodeId, CircleId)>>(iter: T) -> Self {
        let mut partition = Partition::new();
        for (node_id, circle_id) in iter {
            partition.assign(node_id, circle_id);
        }
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassignment_keeps_first_position() {
        let mut partition: Partition = [(5, 1), (2, 0), (9, 1)].into_iter().collect();
        partition.assign(5, 7);

        let ordered: Vec<_> = partition.iter().collect();
        assert_eq!(ordered, vec![(5, 7), (2, 0), (9, 1)]);
        assert_eq!(partition.circle_of(5), Some(7));
        assert_eq!(partition.circle_of(4), None);
        assert_eq!(partition.len(), 3);
    }

    #[test]
    fn edge_detects_self_loop() {
        assert!(Edge::new(3, 3).is_self_loop());
        assert!(!Edge::new(3, 4).is_self_loop());
    }
}
