//! In-process tree overlay.
//!
//! Every participant runs as its own tokio task; messages are CBOR-encoded
//! on send and decoded on delivery, exactly as they would be on a real
//! wire. The tree is a star: node 0 is the root and nodes `1..=n` are its
//! children, in order.

use super::inbox::{Inbox, Mailbox};
use super::traits::{NodeId, Transport, TransportError, TransportResult};
use crate::protocol::messages::Message;
use crate::serialization::{from_cbor, to_cbor};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Root of every local tree.
pub const ROOT: NodeId = NodeId(0);

/// Message and byte counters for one network.
#[derive(Debug, Default)]
struct Traffic {
    messages: AtomicU64,
    bytes: AtomicU64,
}

/// Snapshot of traffic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrafficStats {
    pub messages: u64,
    pub bytes: u64,
}

/// Shared routing table of a local star tree.
#[derive(Debug, Clone)]
pub struct LocalNetwork {
    mailboxes: Arc<Vec<Mailbox>>,
    traffic: Arc<Traffic>,
}

impl LocalNetwork {
    /// Build a star with one root and `children` leaves.
    ///
    /// Returns the network handle and, per node in id order, its transport
    /// and inbox.
    pub fn star(children: usize) -> (Self, Vec<(LocalTransport, Inbox)>) {
        let (mailboxes, inboxes): (Vec<_>, Vec<_>) =
            (0..=children).map(|i| Mailbox::new(NodeId(i))).unzip();

        let network = Self {
            mailboxes: Arc::new(mailboxes),
            traffic: Arc::new(Traffic::default()),
        };

        let endpoints = inboxes
            .into_iter()
            .enumerate()
            .map(|(i, inbox)| {
                let transport = LocalTransport {
                    id: NodeId(i),
                    network: network.clone(),
                };
                (transport, inbox)
            })
            .collect();

        (network, endpoints)
    }

    /// Number of nodes including the root.
    pub fn size(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn traffic(&self) -> TrafficStats {
        TrafficStats {
            messages: self.traffic.messages.load(Ordering::Relaxed),
            bytes: self.traffic.bytes.load(Ordering::Relaxed),
        }
    }

    fn route(&self, from: NodeId, to: NodeId, message: &Message) -> TransportResult<()> {
        let mailbox = self
            .mailboxes
            .get(to.0)
            .ok_or(TransportError::UnknownNode(to))?;

        let bytes = to_cbor(message).map_err(|e| TransportError::Codec(e.to_string()))?;
        let decoded: Message = from_cbor(&bytes).map_err(|e| TransportError::Codec(e.to_string()))?;

        self.traffic.messages.fetch_add(1, Ordering::Relaxed);
        self.traffic
            .bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        trace!(%from, %to, kind = message.kind(), bytes = bytes.len(), "routing message");

        mailbox.deliver(from, decoded)
    }
}

/// One participant's handle on a [`LocalNetwork`].
#[derive(Debug, Clone)]
pub struct LocalTransport {
    id: NodeId,
    network: LocalNetwork,
}

impl LocalTransport {
    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn is_root(&self) -> bool {
        self.id == ROOT
    }

    fn parent(&self) -> Option<NodeId> {
        if self.is_root() {
            None
        } else {
            Some(ROOT)
        }
    }

    fn children(&self) -> Vec<NodeId> {
        if self.is_root() {
            (1..self.network.size()).map(NodeId).collect()
        } else {
            Vec::new()
        }
    }

    async fn send(&self, to: NodeId, message: Message) -> TransportResult<()> {
        self.network.route(self.id, to, &message)
    }
}
