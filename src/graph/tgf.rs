//! Trivial Graph Format loader.
//!
//! Subgraph files list nodes, a `#` separator, then edges:
//!
//! ```text
//! 1234567890 0
//! 1234567891 1
//! #
//! 1234567890 1234567891 1
//! ```
//!
//! Node lines are `identifier owner-index`. Edge lines are
//! `identifier identifier [weight]`; the weight is accepted for
//! compatibility and ignored. Blank lines are skipped.

use super::subgraph::{LocalSubgraph, OwnerPair};
use super::GraphError;
use std::fs;
use std::path::Path;

/// Parse a subgraph from TGF text.
pub fn parse_tgf(input: &str) -> Result<LocalSubgraph, GraphError> {
    let mut lines = input.lines().enumerate();
    let mut nodes = Vec::new();

    for (index, raw) in lines.by_ref() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line == "#" {
            break;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(GraphError::Parse {
                line: index + 1,
                reason: format!("expected `identifier owner`, got {} fields", fields.len()),
            });
        }
        let owner = fields[1].parse::<usize>().map_err(|e| GraphError::Parse {
            line: index + 1,
            reason: format!("invalid owner index '{}': {}", fields[1], e),
        })?;
        nodes.push(OwnerPair::new(fields[0], owner));
    }

    let mut graph = LocalSubgraph::new(nodes);

    for (index, raw) in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if !(2..=3).contains(&fields.len()) {
            return Err(GraphError::Parse {
                line: index + 1,
                reason: format!(
                    "expected `identifier identifier [weight]`, got {} fields",
                    fields.len()
                ),
            });
        }
        if let Some(weight) = fields.get(2) {
            weight.parse::<i64>().map_err(|e| GraphError::Parse {
                line: index + 1,
                reason: format!("invalid weight '{}': {}", weight, e),
            })?;
        }

        let a = resolve(&graph, fields[0], index + 1)?;
        let b = resolve(&graph, fields[1], index + 1)?;
        graph.add_edge(&a, &b);
    }

    Ok(graph)
}

/// Read a subgraph from a TGF file.
pub fn read_tgf(path: &Path) -> Result<LocalSubgraph, GraphError> {
    let contents = fs::read_to_string(path).map_err(|e| GraphError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_tgf(&contents)
}

/// Render a subgraph as TGF (nodes and edges in sorted order, weight 1).
pub fn to_tgf(graph: &LocalSubgraph) -> String {
    let mut nodes: Vec<&OwnerPair> = graph.nodes().collect();
    nodes.sort();

    let mut out = String::new();
    for node in &nodes {
        out.push_str(&format!("{} {}\n", node.identifier, node.owner));
    }
    out.push_str("#\n");

    for node in &nodes {
        let mut self_loops = 0usize;
        for neighbor in graph.neighbors(node) {
            if neighbor == *node {
                // A self-loop appears twice in its own adjacency list
                self_loops += 1;
                if self_loops % 2 == 0 {
                    out.push_str(&format!("{} {} 1\n", node.identifier, node.identifier));
                }
            } else if *node < neighbor {
                out.push_str(&format!("{} {} 1\n", node.identifier, neighbor.identifier));
            }
        }
    }
    out
}

fn resolve(graph: &LocalSubgraph, identifier: &str, line: usize) -> Result<OwnerPair, GraphError> {
    graph
        .owner_of(identifier)
        .map(|owner| OwnerPair::new(identifier, owner))
        .ok_or_else(|| GraphError::UnknownNode {
            line,
            identifier: identifier.to_string(),
        })
}
