//! Trait abstractions for the tree overlay.
//!
//! The protocol core only needs to address nodes, know its place in the
//! tree and hand a message to the overlay. Enumeration, delivery and
//! encoding belong to the implementation behind [`Transport`].

use crate::protocol::messages::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of a participant in the overlay tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Result type for overlay operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Overlay errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Unknown destination {0}")]
    UnknownNode(NodeId),

    #[error("{0} is no longer receiving")]
    Closed(NodeId),

    #[error("Message codec failed: {0}")]
    Codec(String),
}

/// Tree overlay seen from one participant.
///
/// Children are returned in a stable order; the protocol uses a child's
/// position in that list as its telecom index.
#[async_trait]
pub trait Transport: Send + Sync {
    /// This participant's id.
    fn node_id(&self) -> NodeId;

    fn is_root(&self) -> bool;

    /// `None` at the root.
    fn parent(&self) -> Option<NodeId>;

    fn children(&self) -> Vec<NodeId>;

    /// Deliver `message` to `to`.
    async fn send(&self, to: NodeId, message: Message) -> TransportResult<()>;
}
