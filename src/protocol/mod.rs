//! Contact-chaining protocol.
//!
//! - `messages`: wire shapes exchanged over the tree overlay
//! - `directory`: public keys every participant holds before a round
//! - `authority`: the querying root that drives the breadth-first expansion
//! - `telecom`: leaf participants that answer queries about their subscribers
//! - `round`: in-process driver that wires everything together
//! - `error`: shared error taxonomy

pub mod authority;
pub mod directory;
pub mod error;
pub mod messages;
pub mod round;
pub mod telecom;

pub use authority::{Authority, AuthorityCore, ChainOutput, Phase, Step};
pub use directory::{KeyDirectory, RoundKeys};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{AuthorityQuery, Envelope, Init, Message, Reply, RoundComplete};
pub use round::{Role, Round, RoundConfig, SignaturePolicy, Topology, DEFAULT_ROUND_TIMEOUT};
pub use telecom::{Telecom, TelecomCore};
