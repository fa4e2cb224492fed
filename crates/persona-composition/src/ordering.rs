//! Stable dependency ordering over petgraph
//!
//! Nodes are ordered so that every edge `a -> b` puts `a` before `b`. Among
//! nodes whose predecessors are all placed, the one added first goes first,
//! so an edge-free graph keeps insertion order.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Directed "runs before" graph over indices `0..len`
pub(crate) struct OrderGraph {
    graph: DiGraph<usize, ()>,
}

impl OrderGraph {
    /// Graph with `len` nodes and no edges
    pub(crate) fn new(len: usize) -> Self {
        let mut graph = DiGraph::with_capacity(len, 0);
        for index in 0..len {
            graph.add_node(index);
        }
        Self { graph }
    }

    /// Require `before` to be ordered ahead of `after`
    pub(crate) fn edge(&mut self, before: usize, after: usize) {
        let (a, b) = (NodeIndex::new(before), NodeIndex::new(after));
        if before != after && self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    /// Whether `from` is constrained, directly or transitively, to precede `to`
    pub(crate) fn reaches(&self, from: usize, to: usize) -> bool {
        has_path_connecting(&self.graph, NodeIndex::new(from), NodeIndex::new(to), None)
    }

    /// Stable topological order; on a cycle, a node taking part in it
    pub(crate) fn order(&self) -> Result<Vec<usize>, usize> {
        toposort(&self.graph, None).map_err(|cycle| self.graph[cycle.node_id()])?;

        let mut pending: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .count()
            })
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(index, _)| Reverse(index))
            .collect();

        let mut order = Vec::with_capacity(pending.len());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for next in self
                .graph
                .neighbors_directed(NodeIndex::new(index), Direction::Outgoing)
            {
                let slot = &mut pending[next.index()];
                *slot -= 1;
                if *slot == 0 {
                    ready.push(Reverse(next.index()));
                }
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edges_keeps_insertion_order() {
        assert_eq!(OrderGraph::new(4).order().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_edges_are_respected_stably() {
        let mut graph = OrderGraph::new(4);
        graph.edge(3, 0);
        graph.edge(2, 1);
        assert_eq!(graph.order().unwrap(), vec![2, 1, 3, 0]);
        assert!(graph.reaches(3, 0));
        assert!(!graph.reaches(0, 3));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut graph = OrderGraph::new(3);
        graph.edge(0, 1);
        graph.edge(1, 2);
        graph.edge(2, 1);
        assert!(graph.order().is_err());
    }
}
