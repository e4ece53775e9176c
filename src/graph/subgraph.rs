//! Per-telecom view of the identifier graph.
//!
//! Each telecom holds only the part of the graph it knows about: its own
//! subscribers plus the foreign endpoints of their edges. Every node is an
//! [`OwnerPair`], so the telecom can tell the authority which peer must be
//! asked about a neighbor next.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A graph node: an identifier and the telecom that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerPair {
    pub identifier: String,
    pub owner: usize,
}

impl OwnerPair {
    pub fn new(identifier: impl Into<String>, owner: usize) -> Self {
        Self {
            identifier: identifier.into(),
            owner,
        }
    }
}

impl fmt::Display for OwnerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identifier, self.owner)
    }
}

/// Undirected adjacency view owned by one telecom.
///
/// The visited set lives for one round; a fresh round needs a fresh view
/// (or [`LocalSubgraph::reset_visited`]).
#[derive(Debug, Clone, Default)]
pub struct LocalSubgraph {
    nodes: HashSet<OwnerPair>,
    owners: HashMap<String, usize>,
    adjacency: HashMap<OwnerPair, Vec<OwnerPair>>,
    visited: HashSet<OwnerPair>,
}

impl LocalSubgraph {
    /// Build a subgraph over `nodes` with no edges.
    pub fn new(nodes: impl IntoIterator<Item = OwnerPair>) -> Self {
        let mut graph = Self::default();
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    /// Build a subgraph from a node list and an edge list.
    ///
    /// Edges naming unknown nodes are skipped, as with [`add_edge`](Self::add_edge).
    pub fn with_edges(
        nodes: impl IntoIterator<Item = OwnerPair>,
        edges: impl IntoIterator<Item = (OwnerPair, OwnerPair)>,
    ) -> Self {
        let mut graph = Self::new(nodes);
        for (a, b) in edges {
            graph.add_edge(&a, &b);
        }
        graph
    }

    pub fn add_node(&mut self, node: OwnerPair) {
        if self.nodes.contains(&node) {
            return;
        }
        self.owners.insert(node.identifier.clone(), node.owner);
        self.nodes.insert(node);
    }

    /// Insert an undirected edge. No-op if either endpoint is unknown.
    pub fn add_edge(&mut self, a: &OwnerPair, b: &OwnerPair) {
        if !self.contains_node(a) || !self.contains_node(b) {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().push(b.clone());
        self.adjacency.entry(b.clone()).or_default().push(a.clone());
    }

    pub fn contains_node(&self, node: &OwnerPair) -> bool {
        self.nodes.contains(node)
    }

    pub fn contains_edge(&self, a: &OwnerPair, b: &OwnerPair) -> bool {
        self.neighbors(a).iter().any(|n| n == b)
    }

    /// Neighbors of `node` in insertion order; empty if absent.
    pub fn neighbors(&self, node: &OwnerPair) -> &[OwnerPair] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owner index recorded for an identifier, if known.
    pub fn owner_of(&self, identifier: &str) -> Option<usize> {
        self.owners.get(identifier).copied()
    }

    pub fn has_visited(&self, node: &OwnerPair) -> bool {
        self.visited.contains(node)
    }

    /// Mark `node` visited. Returns `true` the first time only.
    pub fn mark_visited(&mut self, node: &OwnerPair) -> bool {
        if self.visited.contains(node) {
            return false;
        }
        self.visited.insert(node.clone())
    }

    /// Forget all visited marks (start of a new round).
    pub fn reset_visited(&mut self) {
        self.visited.clear();
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    pub fn nodes(&self) -> impl Iterator<Item = &OwnerPair> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node_list() -> Vec<OwnerPair> {
        (0..6)
            .map(|i| OwnerPair::new(format!("123456789{}", i), i))
            .collect()
    }

    #[test]
    fn test_contains_added_nodes() {
        let nodes = node_list();
        let graph = LocalSubgraph::new(nodes.clone());

        for node in &nodes {
            assert!(graph.contains_node(node));
        }
        assert_eq!(graph.node_count(), 6);
        assert!(!graph.contains_node(&OwnerPair::new("1234567890", 1)));
    }

    #[test]
    fn test_edges_are_symmetric() {
        let n = node_list();
        let mut graph = LocalSubgraph::new(n.clone());

        graph.add_edge(&n[0], &n[1]);
        graph.add_edge(&n[1], &n[3]);
        graph.add_edge(&n[1], &n[2]);
        graph.add_edge(&n[5], &n[4]);

        for (a, b) in [(0, 1), (1, 3), (1, 2), (5, 4)] {
            assert!(graph.contains_edge(&n[a], &n[b]));
            assert!(graph.contains_edge(&n[b], &n[a]));
        }
        assert!(!graph.contains_edge(&n[0], &n[2]));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_neighbors_in_insertion_order() {
        let n = node_list();
        let mut graph = LocalSubgraph::new(n.clone());
        graph.add_edge(&n[1], &n[3]);
        graph.add_edge(&n[1], &n[0]);
        graph.add_edge(&n[1], &n[2]);

        assert_eq!(graph.neighbors(&n[1]), &[n[3].clone(), n[0].clone(), n[2].clone()]);
    }

    #[test]
    fn test_neighbors_of_absent_node_is_empty() {
        let graph = LocalSubgraph::new(node_list());
        assert!(graph.neighbors(&OwnerPair::new("nobody", 9)).is_empty());
    }

    #[test]
    fn test_add_edge_with_unknown_endpoint_is_noop() {
        let n = node_list();
        let mut graph = LocalSubgraph::new(n.clone());
        let stranger = OwnerPair::new("5550000", 0);

        graph.add_edge(&n[0], &stranger);
        assert!(graph.neighbors(&n[0]).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_owner_pair_equality_is_structural() {
        let a = OwnerPair::new("A", 0);
        assert_eq!(a, OwnerPair::new("A", 0));
        assert_ne!(a, OwnerPair::new("A", 1));
        assert_ne!(a, OwnerPair::new("B", 0));
    }

    #[test]
    fn test_mark_visited_is_idempotent() {
        let n = node_list();
        let mut graph = LocalSubgraph::new(n.clone());

        assert!(!graph.has_visited(&n[0]));
        assert!(graph.mark_visited(&n[0]));
        assert!(!graph.mark_visited(&n[0]));
        assert!(graph.has_visited(&n[0]));

        graph.reset_visited();
        assert!(!graph.has_visited(&n[0]));
    }

    #[test]
    fn test_owner_of() {
        let graph = LocalSubgraph::new(node_list());
        assert_eq!(graph.owner_of("1234567893"), Some(3));
        assert_eq!(graph.owner_of("missing"), None);
    }

    proptest! {
        /// Property: AddEdge(a, b) implies b ∈ Neighbors(a) and a ∈ Neighbors(b)
        #[test]
        fn add_edge_is_symmetric(
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..40),
        ) {
            let nodes: Vec<_> = (0..8).map(|i| OwnerPair::new(format!("n{}", i), i % 3)).collect();
            let mut graph = LocalSubgraph::new(nodes.clone());

            for (a, b) in &edges {
                graph.add_edge(&nodes[*a], &nodes[*b]);
            }
            for (a, b) in &edges {
                prop_assert!(graph.neighbors(&nodes[*a]).contains(&nodes[*b]));
                prop_assert!(graph.neighbors(&nodes[*b]).contains(&nodes[*a]));
            }
        }

        /// Property: marking twice is observably the same as marking once
        #[test]
        fn visited_idempotence(marks in prop::collection::vec(0usize..8, 0..30)) {
            let nodes: Vec<_> = (0..8).map(|i| OwnerPair::new(format!("n{}", i), 0)).collect();
            let mut once = LocalSubgraph::new(nodes.clone());
            let mut twice = LocalSubgraph::new(nodes.clone());

            for i in &marks {
                once.mark_visited(&nodes[*i]);
                twice.mark_visited(&nodes[*i]);
                twice.mark_visited(&nodes[*i]);
            }
            for node in &nodes {
                prop_assert_eq!(once.has_visited(node), twice.has_visited(node));
                prop_assert_eq!(once.has_visited(node), marks.iter().any(|i| &nodes[*i] == node));
            }
        }
    }
}
