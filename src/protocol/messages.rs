//! Protocol message shapes.
//!
//! Four message kinds travel over the overlay:
//!
//! | Message | Direction | Purpose |
//! |---|---|---|
//! | `Init` | authority → itself | start the round |
//! | `AuthorityQuery` | authority → telecom | ask about one encrypted identifier |
//! | `Reply` | telecom → authority | echo receipt plus encrypted neighbors |
//! | `RoundComplete` | authority → telecoms | terminal signal |
//!
//! All shapes are serde types; the wire encoding is CBOR (see `serialization`).

use crate::crypto::{Ciphertext, Signature, VerifyingKey};
use crate::transport::NodeId;
use serde::{Deserialize, Serialize};

/// Self-addressed start trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Init {}

/// Signed query for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityQuery {
    /// Correlates the reply with this query.
    pub query_id: u64,
    /// Identifier encrypted under the destination telecom's key.
    pub encrypted_query: Ciphertext,
    /// Telecom index this query is meant for.
    pub owner_index: usize,
    /// Hops still allowed from this identifier.
    pub remaining_depth: u32,
    pub signature: Signature,
    pub verification_key: VerifyingKey,
}

/// Telecom answer to an [`AuthorityQuery`].
///
/// `encrypted_neighbors[i]` is encrypted for telecom `neighbor_owners[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub query_id: u64,
    /// The queried identifier, re-encrypted under the authority's key.
    pub encrypted_ack: Ciphertext,
    pub encrypted_neighbors: Vec<Ciphertext>,
    pub neighbor_owners: Vec<usize>,
}

/// Terminal broadcast from the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundComplete {}

/// Any protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Init(Init),
    AuthorityQuery(AuthorityQuery),
    Reply(Reply),
    RoundComplete(RoundComplete),
}

impl Message {
    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::AuthorityQuery(_) => "authority_query",
            Self::Reply(_) => "reply",
            Self::RoundComplete(_) => "round_complete",
        }
    }
}

impl From<Init> for Message {
    fn from(m: Init) -> Self {
        Self::Init(m)
    }
}

impl From<AuthorityQuery> for Message {
    fn from(m: AuthorityQuery) -> Self {
        Self::AuthorityQuery(m)
    }
}

impl From<Reply> for Message {
    fn from(m: Reply) -> Self {
        Self::Reply(m)
    }
}

impl From<RoundComplete> for Message {
    fn from(m: RoundComplete) -> Self {
        Self::RoundComplete(m)
    }
}

/// A delivered message together with its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<M> {
    pub from: NodeId,
    pub message: M,
}
