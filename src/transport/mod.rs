//! Tree overlay transport.
//!
//! This module provides:
//! - The `Transport` trait the protocol state machines are generic over
//! - Per-kind inbound channels (`Inbox`) that dispatch loops select on
//! - An in-process star overlay (`LocalNetwork`) with CBOR on the wire

pub mod inbox;
pub mod local;
pub mod traits;

pub use inbox::{Inbox, Mailbox};
pub use local::{LocalNetwork, LocalTransport, TrafficStats, ROOT};
pub use traits::{NodeId, Transport, TransportError, TransportResult};
