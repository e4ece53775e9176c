//! Telecom participants.
//!
//! A telecom answers signed queries about identifiers it owns. It never
//! learns the full chain: it sees one identifier at a time and returns
//! the unvisited neighbors, each encrypted for whichever telecom owns it.

use super::authority::Phase;
use super::directory::KeyDirectory;
use super::error::{ProtocolError, ProtocolResult};
use super::messages::{AuthorityQuery, Envelope, Reply, RoundComplete};
use super::round::SignaturePolicy;
use crate::crypto::{decrypt_identifier, encrypt_identifier, query_signing_bytes, KeyPair};
use crate::graph::{LocalSubgraph, OwnerPair};
use crate::transport::{Inbox, NodeId, Transport};
use tracing::{debug, error, info, warn};

/// Network-free telecom state machine.
#[derive(Debug)]
pub struct TelecomCore {
    index: usize,
    keys: KeyPair,
    directory: KeyDirectory,
    subgraph: LocalSubgraph,
    policy: SignaturePolicy,
    phase: Phase,
    answered: u64,
}

impl TelecomCore {
    pub fn new(
        index: usize,
        keys: KeyPair,
        directory: KeyDirectory,
        subgraph: LocalSubgraph,
        policy: SignaturePolicy,
    ) -> Self {
        Self {
            index,
            keys,
            directory,
            subgraph,
            policy,
            phase: Phase::Idle,
            answered: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Queries answered so far this round.
    pub fn answered(&self) -> u64 {
        self.answered
    }

    pub fn subgraph(&self) -> &LocalSubgraph {
        &self.subgraph
    }

    /// Answer one authority query.
    ///
    /// Neighbors are only returned when depth remains, and each one at most
    /// once per round. The queried node itself counts as visited so that a
    /// later path back to it is not expanded again.
    pub fn answer(&mut self, query: &AuthorityQuery) -> ProtocolResult<Reply> {
        if self.phase == Phase::Done {
            return Err(ProtocolError::Routing(format!(
                "query {} arrived after round completion",
                query.query_id
            )));
        }
        if query.owner_index != self.index {
            return Err(ProtocolError::Routing(format!(
                "query {} is for telecom {}, not {}",
                query.query_id, query.owner_index, self.index
            )));
        }
        self.check_signature(query)?;
        self.phase = Phase::Active;

        let identifier = decrypt_identifier(self.keys.secret(), &query.encrypted_query)?;
        let encrypted_ack = encrypt_identifier(self.directory.authority(), &identifier)?;

        let mut encrypted_neighbors = Vec::new();
        let mut neighbor_owners = Vec::new();

        let node = OwnerPair::new(identifier, self.index);
        if self.subgraph.contains_node(&node) {
            self.subgraph.mark_visited(&node);

            if query.remaining_depth > 0 {
                let neighbors = self.subgraph.neighbors(&node).to_vec();
                for neighbor in neighbors {
                    if !self.subgraph.mark_visited(&neighbor) {
                        continue;
                    }
                    let key = match self.directory.telecom(neighbor.owner) {
                        Ok(key) => key,
                        Err(e) => {
                            warn!(owner = neighbor.owner, error = %e, "skipping neighbor with unknown owner");
                            continue;
                        }
                    };
                    match encrypt_identifier(key, &neighbor.identifier) {
                        Ok(ciphertext) => {
                            encrypted_neighbors.push(ciphertext);
                            neighbor_owners.push(neighbor.owner);
                        }
                        Err(e) => {
                            warn!(owner = neighbor.owner, error = %e, "skipping neighbor that cannot be encrypted");
                        }
                    }
                }
            }
        } else {
            debug!(query_id = query.query_id, "identifier not in local subgraph");
        }

        self.answered += 1;
        Ok(Reply {
            query_id: query.query_id,
            encrypted_ack,
            encrypted_neighbors,
            neighbor_owners,
        })
    }

    /// Handle the authority's terminal broadcast.
    pub fn complete(&mut self) {
        self.phase = Phase::Done;
    }

    fn check_signature(&self, query: &AuthorityQuery) -> ProtocolResult<()> {
        let pinned = self.directory.authority_verifying_key();

        let verdict = if query.verification_key != *pinned {
            Err("query carries a key other than the authority's".to_string())
        } else {
            let bytes = query_signing_bytes(
                &query.encrypted_query,
                query.owner_index,
                query.remaining_depth,
            );
            pinned
                .verify(&bytes, &query.signature)
                .map_err(|e| e.to_string())
        };

        match (verdict, self.policy) {
            (Ok(()), _) => Ok(()),
            (Err(reason), SignaturePolicy::Enforce) => Err(ProtocolError::SignatureVerification {
                query_id: query.query_id,
                reason,
            }),
            (Err(reason), SignaturePolicy::LogOnly) => {
                warn!(query_id = query.query_id, %reason, "answering query with bad signature");
                Ok(())
            }
        }
    }
}

/// Telecom participant: the core plus its overlay handle.
pub struct Telecom<T: Transport> {
    transport: T,
    core: TelecomCore,
}

impl<T: Transport> Telecom<T> {
    pub fn new(transport: T, core: TelecomCore) -> ProtocolResult<Self> {
        if transport.parent().is_none() {
            return Err(ProtocolError::Construction(format!(
                "telecom {} has no parent to answer to",
                core.index()
            )));
        }
        Ok(Self { transport, core })
    }

    /// Serve queries until the authority signals completion.
    pub async fn run(mut self, mut inbox: Inbox) -> ProtocolResult<TelecomCore> {
        let node = self.transport.node_id();
        info!(
            %node,
            index = self.core.index(),
            identifiers = self.core.subgraph().node_count(),
            "telecom ready"
        );

        while self.core.phase() != Phase::Done {
            let result = tokio::select! {
                Some(envelope) = inbox.queries.recv() => self.handle_query(envelope).await,
                Some(envelope) = inbox.complete.recv() => self.handle_complete(envelope),
                Some(_) = inbox.init.recv() => Err(ProtocolError::UnexpectedMessage {
                    node,
                    kind: "init",
                }),
                Some(_) = inbox.replies.recv() => Err(ProtocolError::UnexpectedMessage {
                    node,
                    kind: "reply",
                }),
                else => Err(ProtocolError::Aborted(format!("{node} inbox closed"))),
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    error!(%node, error = %e, "telecom stopping");
                    return Err(e);
                }
                Err(e) => warn!(%node, error = %e, "dropping message"),
            }
        }

        info!(%node, answered = self.core.answered(), "telecom done");
        Ok(self.core)
    }

    async fn handle_query(&mut self, envelope: Envelope<AuthorityQuery>) -> ProtocolResult<()> {
        let parent = self.authority(envelope.from)?;
        let reply = self.core.answer(&envelope.message)?;
        debug!(
            query_id = reply.query_id,
            neighbors = reply.neighbor_owners.len(),
            "replying"
        );
        self.transport.send(parent, reply.into()).await?;
        Ok(())
    }

    fn handle_complete(&mut self, envelope: Envelope<RoundComplete>) -> ProtocolResult<()> {
        self.authority(envelope.from)?;
        self.core.complete();
        Ok(())
    }

    fn authority(&self, from: NodeId) -> ProtocolResult<NodeId> {
        match self.transport.parent() {
            Some(parent) if parent == from => Ok(parent),
            _ => Err(ProtocolError::Routing(format!(
                "message from {from}, which is not the authority"
            ))),
        }
    }
}
