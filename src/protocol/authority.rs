//! The querying authority.
//!
//! [`AuthorityCore`] holds the round state and makes every decision
//! without touching the network: it turns warrants into signed queries
//! and replies into new warrants. [`Authority`] wraps it in the dispatch
//! loop that moves messages between the core and the overlay.
//!
//! Exactly one query is in flight at a time. The next warrant is popped
//! only once the previous reply has been absorbed, so the frontier is
//! drained in breadth-first order.

use super::directory::KeyDirectory;
use super::error::{ProtocolError, ProtocolResult};
use super::messages::{AuthorityQuery, Envelope, Init, Reply, RoundComplete};
use crate::crypto::{
    decrypt_identifier, encrypt_identifier, query_signing_bytes, KeyPair, SigningKey,
};
use crate::frontier::{Warrant, WarrantPayload, WarrantQueue};
use crate::transport::{Inbox, NodeId, Transport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Lifecycle of one participant within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Active,
    Done,
}

/// Result of a completed round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainOutput {
    /// Every identifier reached, seed included.
    pub identifiers: BTreeSet<String>,
    pub queries: u64,
    pub replies: u64,
    /// Messages routed through the overlay (filled in by the round driver).
    pub messages: u64,
    pub bytes: u64,
}

impl ChainOutput {
    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// What the dispatch loop must do after a handler ran.
#[derive(Debug)]
pub enum Step {
    /// Send `query` to the telecom at index `telecom`.
    Dispatch { telecom: usize, query: AuthorityQuery },
    /// Nothing to send; a reply is still outstanding.
    Wait,
    /// The frontier is exhausted and nothing is outstanding.
    Complete(ChainOutput),
}

#[derive(Debug, Clone, Copy)]
struct PendingQuery {
    telecom: usize,
    depth: u32,
}

/// Network-free authority state machine.
#[derive(Debug)]
pub struct AuthorityCore {
    keys: KeyPair,
    signing_key: SigningKey,
    directory: KeyDirectory,
    frontier: WarrantQueue,
    phase: Phase,
    pending: HashMap<u64, PendingQuery>,
    next_query_id: u64,
    current_depth: Option<u32>,
    output: BTreeSet<String>,
    queries: u64,
    replies: u64,
}

impl AuthorityCore {
    /// Create the authority with `seed` as the only frontier entry.
    pub fn new(
        keys: KeyPair,
        signing_key: SigningKey,
        directory: KeyDirectory,
        seed: Warrant,
        frontier_capacity: usize,
    ) -> Self {
        let mut frontier = WarrantQueue::new(frontier_capacity);
        frontier.push(seed);

        Self {
            keys,
            signing_key,
            directory,
            frontier,
            phase: Phase::Idle,
            pending: HashMap::new(),
            next_query_id: 0,
            current_depth: None,
            output: BTreeSet::new(),
            queries: 0,
            replies: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of queries sent but not yet answered.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Remaining depth of the most recently dispatched query.
    pub fn current_depth(&self) -> Option<u32> {
        self.current_depth
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn output(&self) -> &BTreeSet<String> {
        &self.output
    }

    /// Whether the round can no longer make progress on its own.
    pub fn is_stalled(&self) -> bool {
        self.phase == Phase::Active && self.pending.is_empty()
    }

    /// Handle `Init`: dispatch the seed query.
    pub fn start(&mut self) -> ProtocolResult<Step> {
        if self.phase != Phase::Idle {
            return Err(ProtocolError::Routing(format!(
                "round already {:?}, ignoring init",
                self.phase
            )));
        }
        self.phase = Phase::Active;
        self.dispatch_next()
    }

    /// Handle a reply received from the telecom at index `telecom`.
    pub fn on_reply(&mut self, telecom: usize, reply: Reply) -> ProtocolResult<Step> {
        if self.phase != Phase::Active {
            return Err(ProtocolError::Routing(format!(
                "reply {} arrived while round is {:?}",
                reply.query_id, self.phase
            )));
        }

        let pending = self.pending.remove(&reply.query_id).ok_or_else(|| {
            ProtocolError::Routing(format!("no outstanding query {}", reply.query_id))
        })?;
        if pending.telecom != telecom {
            self.pending.insert(reply.query_id, pending);
            return Err(ProtocolError::Routing(format!(
                "reply {} came from telecom {} but was sent to telecom {}",
                reply.query_id, telecom, pending.telecom
            )));
        }
        self.replies += 1;

        match decrypt_identifier(self.keys.secret(), &reply.encrypted_ack) {
            Ok(identifier) => {
                debug!(query_id = reply.query_id, "acknowledged identifier");
                self.output.insert(identifier);
            }
            Err(e) => warn!(
                query_id = reply.query_id,
                error = %e,
                "could not decrypt acknowledgement, skipping it"
            ),
        }

        match Self::check_reply(&reply, pending.depth) {
            Ok(()) => {
                let depth = pending.depth.saturating_sub(1);
                for (ciphertext, owner) in reply
                    .encrypted_neighbors
                    .into_iter()
                    .zip(reply.neighbor_owners)
                {
                    self.frontier.push(Warrant::sealed(ciphertext, owner, depth));
                }
            }
            Err(e) => warn!(error = %e, "discarding neighbors of malformed reply"),
        }

        self.dispatch_next()
    }

    /// Abandon the round.
    pub fn abort(&mut self) {
        self.phase = Phase::Done;
        self.pending.clear();
    }

    fn check_reply(reply: &Reply, depth: u32) -> ProtocolResult<()> {
        if reply.encrypted_neighbors.len() != reply.neighbor_owners.len() {
            return Err(ProtocolError::MalformedReply {
                query_id: reply.query_id,
                reason: format!(
                    "{} neighbors but {} owners",
                    reply.encrypted_neighbors.len(),
                    reply.neighbor_owners.len()
                ),
            });
        }
        if depth == 0 && !reply.encrypted_neighbors.is_empty() {
            return Err(ProtocolError::MalformedReply {
                query_id: reply.query_id,
                reason: "neighbors returned for a depth-0 query".to_string(),
            });
        }
        Ok(())
    }

    fn dispatch_next(&mut self) -> ProtocolResult<Step> {
        if let Some(warrant) = self.frontier.pop() {
            let (telecom, query) = self.build_query(warrant)?;
            return Ok(Step::Dispatch { telecom, query });
        }

        if self.pending.is_empty() {
            self.phase = Phase::Done;
            Ok(Step::Complete(ChainOutput {
                identifiers: std::mem::take(&mut self.output),
                queries: self.queries,
                replies: self.replies,
                ..ChainOutput::default()
            }))
        } else {
            Ok(Step::Wait)
        }
    }

    fn build_query(&mut self, warrant: Warrant) -> ProtocolResult<(usize, AuthorityQuery)> {
        let telecom_key = self.directory.telecom(warrant.destination)?;

        let encrypted_query = match warrant.payload {
            WarrantPayload::Plain(identifier) => encrypt_identifier(telecom_key, &identifier)?,
            WarrantPayload::Sealed(ciphertext) => ciphertext,
        };
        let signature = self.signing_key.sign(&query_signing_bytes(
            &encrypted_query,
            warrant.destination,
            warrant.depth,
        ))?;

        let query_id = self.next_query_id;
        self.next_query_id += 1;
        self.pending.insert(
            query_id,
            PendingQuery {
                telecom: warrant.destination,
                depth: warrant.depth,
            },
        );
        self.current_depth = Some(warrant.depth);
        self.queries += 1;

        Ok((
            warrant.destination,
            AuthorityQuery {
                query_id,
                encrypted_query,
                owner_index: warrant.destination,
                remaining_depth: warrant.depth,
                signature,
                verification_key: self.signing_key.verifying_key(),
            },
        ))
    }
}

/// Authority participant: the core plus its overlay handle.
pub struct Authority<T: Transport> {
    transport: T,
    core: AuthorityCore,
    completion: Option<oneshot::Sender<ProtocolResult<ChainOutput>>>,
}

impl<T: Transport> Authority<T> {
    /// `completion` receives the round outcome exactly once.
    pub fn new(
        transport: T,
        core: AuthorityCore,
        completion: oneshot::Sender<ProtocolResult<ChainOutput>>,
    ) -> ProtocolResult<Self> {
        if !transport.is_root() {
            return Err(ProtocolError::Construction(format!(
                "authority must sit at the tree root, not at {}",
                transport.node_id()
            )));
        }
        Ok(Self {
            transport,
            core,
            completion: Some(completion),
        })
    }

    /// Queue the self-addressed `Init` that starts the round.
    pub async fn trigger(&self) -> ProtocolResult<()> {
        self.transport
            .send(self.transport.node_id(), Init {}.into())
            .await?;
        Ok(())
    }

    /// Serve the round until it completes or fails.
    pub async fn run(mut self, mut inbox: Inbox) {
        let node = self.transport.node_id();
        info!(%node, telecoms = self.transport.children().len(), "authority ready");

        while self.core.phase() != Phase::Done {
            let result = tokio::select! {
                Some(envelope) = inbox.init.recv() => self.handle_init(envelope).await,
                Some(envelope) = inbox.replies.recv() => self.handle_reply(envelope).await,
                Some(_) = inbox.queries.recv() => Err(ProtocolError::UnexpectedMessage {
                    node,
                    kind: "authority_query",
                }),
                Some(_) = inbox.complete.recv() => Err(ProtocolError::UnexpectedMessage {
                    node,
                    kind: "round_complete",
                }),
                else => Err(ProtocolError::Aborted("authority inbox closed".to_string())),
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "round failed");
                    self.finish(Err(e)).await;
                }
                Err(e) if self.core.is_stalled() => {
                    error!(error = %e, "round cannot make progress");
                    self.finish(Err(e)).await;
                }
                Err(e) => warn!(error = %e, "dropping message"),
            }
        }
    }

    async fn handle_init(&mut self, envelope: Envelope<Init>) -> ProtocolResult<()> {
        if envelope.from != self.transport.node_id() {
            return Err(ProtocolError::Routing(format!(
                "init from {} ignored",
                envelope.from
            )));
        }
        let step = self.core.start()?;
        self.execute(step).await
    }

    async fn handle_reply(&mut self, envelope: Envelope<Reply>) -> ProtocolResult<()> {
        let telecom = self.telecom_index(envelope.from)?;
        let step = self.core.on_reply(telecom, envelope.message)?;
        self.execute(step).await
    }

    async fn execute(&mut self, step: Step) -> ProtocolResult<()> {
        match step {
            Step::Dispatch { telecom, query } => {
                let to = self.telecom_node(telecom)?;
                debug!(
                    query_id = query.query_id,
                    %to,
                    depth = query.remaining_depth,
                    "dispatching query"
                );
                self.transport.send(to, query.into()).await?;
            }
            Step::Wait => {}
            Step::Complete(output) => {
                info!(
                    identifiers = output.len(),
                    queries = output.queries,
                    "frontier exhausted"
                );
                self.finish(Ok(output)).await;
            }
        }
        Ok(())
    }

    async fn finish(&mut self, outcome: ProtocolResult<ChainOutput>) {
        self.core.abort();

        for child in self.transport.children() {
            if let Err(e) = self.transport.send(child, RoundComplete {}.into()).await {
                warn!(%child, error = %e, "could not deliver round completion");
            }
        }

        if let Some(completion) = self.completion.take() {
            if completion.send(outcome).is_err() {
                warn!("round outcome dropped, caller is gone");
            }
        }
    }

    fn telecom_index(&self, node: NodeId) -> ProtocolResult<usize> {
        self.transport
            .children()
            .iter()
            .position(|child| *child == node)
            .ok_or_else(|| ProtocolError::Routing(format!("reply from non-telecom {node}")))
    }

    fn telecom_node(&self, index: usize) -> ProtocolResult<NodeId> {
        let children = self.transport.children();
        children
            .get(index)
            .copied()
            .ok_or(ProtocolError::InvalidDestination {
                index,
                telecoms: children.len(),
            })
    }
}
