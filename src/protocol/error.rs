//! Protocol error taxonomy.
//!
//! Handler errors go back to the participant's dispatch loop. The loop
//! logs recoverable ones and keeps serving; fatal ones end the round and
//! reach the caller of `Round::run`.

use crate::crypto::CryptoError;
use crate::transport::{NodeId, TransportError};
use std::time::Duration;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The topology cannot host a round (wrong number of authorities, no telecoms).
    #[error("Invalid topology: {0}")]
    Construction(String),

    /// A message reached a participant it was not meant for.
    #[error("Routing error: {0}")]
    Routing(String),

    /// A warrant names a telecom outside the configured range.
    #[error("Invalid destination: telecom {index} requested but only {telecoms} configured")]
    InvalidDestination { index: usize, telecoms: usize },

    #[error("Decryption failed: {0}")]
    Decryption(CryptoError),

    #[error("Signature verification failed for query {query_id}: {reason}")]
    SignatureVerification { query_id: u64, reason: String },

    /// Any other primitive failure (key generation, embedding, oversize identifiers).
    #[error("Cryptographic failure: {0}")]
    Crypto(CryptoError),

    #[error("Malformed reply {query_id}: {reason}")]
    MalformedReply { query_id: u64, reason: String },

    #[error("{node} does not handle {kind} messages")]
    UnexpectedMessage { node: NodeId, kind: &'static str },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Round did not complete within {0:?}")]
    Timeout(Duration),

    /// The round ended without the authority reporting a result.
    #[error("Round aborted: {0}")]
    Aborted(String),
}

impl ProtocolError {
    /// Whether this error ends the round.
    ///
    /// Everything else is logged by the dispatch loop, which then waits for
    /// the next message.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Construction(_)
                | Self::InvalidDestination { .. }
                | Self::Transport(_)
                | Self::Timeout(_)
                | Self::Aborted(_)
        )
    }
}

impl From<CryptoError> for ProtocolError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decode(_) | CryptoError::InvalidPoint => Self::Decryption(err),
            other => Self::Crypto(other),
        }
    }
}
