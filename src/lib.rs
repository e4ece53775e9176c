//! PPCC - Privacy-Preserving Contact Chaining
//!
//! An authority expands a seed identifier breadth-first across a graph that
//! is split between several telecoms, without any telecom learning more
//! than the identifiers it is asked about, and without the authority
//! learning anything beyond the chain it is entitled to.
//!
//! Key principles:
//! - Identifiers travel only as ElGamal ciphertexts over ristretto255
//! - Every query is Schnorr-signed by the authority
//! - Each telecom returns a neighbor at most once per round
//! - Expansion stops at the requested depth

pub mod crypto;
pub mod frontier;
pub mod graph;
pub mod protocol;
pub mod serialization;
pub mod transport;
