//! Identifier graph partitions.
//!
//! - `subgraph`: the per-telecom adjacency view the protocol expands against
//! - `tgf`: loader for the Trivial Graph Format files the CLI consumes
//! - `partition`: split a whole graph into per-telecom views

pub mod partition;
pub mod subgraph;
pub mod tgf;

pub use partition::split_by_owner;
pub use subgraph::{LocalSubgraph, OwnerPair};
pub use tgf::{parse_tgf, read_tgf, to_tgf};

use thiserror::Error;

/// Graph loading errors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Failed to read graph file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Line {line}: edge references unknown node '{identifier}'")]
    UnknownNode { line: usize, identifier: String },
}
