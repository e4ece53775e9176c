//! Split a whole identifier graph into per-telecom subgraphs.
//!
//! Telecom `i` sees every node it owns plus the foreign endpoint of each
//! edge touching one of its nodes. Edges between two foreign nodes are
//! invisible to it.

use super::subgraph::{LocalSubgraph, OwnerPair};

/// Partition `edges` among `telecoms` telecoms by endpoint owner.
///
/// `nodes` lists isolated identifiers too, so they still exist at their
/// owner. Nodes or edge endpoints whose owner is out of range are only
/// visible from the in-range side.
pub fn split_by_owner(
    telecoms: usize,
    nodes: &[OwnerPair],
    edges: &[(OwnerPair, OwnerPair)],
) -> Vec<LocalSubgraph> {
    let mut parts: Vec<LocalSubgraph> = (0..telecoms).map(|_| LocalSubgraph::default()).collect();

    for node in nodes {
        if let Some(part) = parts.get_mut(node.owner) {
            part.add_node(node.clone());
        }
    }

    for (a, b) in edges {
        for owner in [a.owner, b.owner] {
            let Some(part) = parts.get_mut(owner) else {
                continue;
            };
            part.add_node(a.clone());
            part.add_node(b.clone());
            if !part.contains_edge(a, b) {
                part.add_edge(a, b);
            }
            if a.owner == b.owner {
                break;
            }
        }
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chain() {
        let a = OwnerPair::new("A", 0);
        let b = OwnerPair::new("B", 1);
        let c = OwnerPair::new("C", 2);
        let parts = split_by_owner(
            3,
            &[a.clone(), b.clone(), c.clone()],
            &[(a.clone(), b.clone()), (b.clone(), c.clone())],
        );

        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains_edge(&a, &b));
        assert!(!parts[0].contains_node(&c));
        assert_eq!(parts[1].edge_count(), 2);
        assert!(parts[2].contains_edge(&c, &b));
        assert!(!parts[2].contains_node(&a));
    }

    #[test]
    fn test_same_owner_edge_added_once() {
        let a = OwnerPair::new("A", 0);
        let b = OwnerPair::new("B", 0);
        let parts = split_by_owner(1, &[], &[(a.clone(), b.clone()), (b.clone(), a.clone())]);

        assert_eq!(parts[0].edge_count(), 1);
        assert_eq!(parts[0].neighbors(&a), &[b]);
    }

    #[test]
    fn test_isolated_node_kept() {
        let lone = OwnerPair::new("L", 1);
        let parts = split_by_owner(2, &[lone.clone()], &[]);
        assert!(parts[1].contains_node(&lone));
        assert_eq!(parts[0].node_count(), 0);
    }

    #[test]
    fn test_out_of_range_owner_ignored() {
        let a = OwnerPair::new("A", 0);
        let far = OwnerPair::new("F", 7);
        let parts = split_by_owner(1, &[far.clone()], &[(a.clone(), far.clone())]);
        assert!(parts[0].contains_edge(&a, &far));
    }
}
