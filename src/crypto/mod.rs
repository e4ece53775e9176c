/// Cryptographic primitives for the contact-chaining protocol
///
/// This module implements:
/// - ElGamal encryption over ristretto255, with identifier re-encryption
///   toward a new recipient
/// - Schnorr signatures for authority-to-telecom query authentication
/// - Key material (ElGamal key pairs, system randomness)
pub mod elgamal;
pub mod keys;
pub mod schnorr;

#[cfg(test)]
mod proptests;

pub use elgamal::{
    decrypt, decrypt_identifier, encrypt, encrypt_identifier, reencrypt_identifier, Ciphertext,
    EMBED_CAPACITY,
};
pub use keys::{KeyPair, PublicKey, SecretKey};
pub use schnorr::{query_signing_bytes, Signature, SigningKey, VerifyingKey};

use thiserror::Error;

/// Cryptographic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Failed to generate random key material: {0}")]
    KeyGeneration(String),

    #[error("Could not embed plaintext as a group element")]
    Embedding,

    #[error("Plaintext of {len} bytes exceeds single-ciphertext capacity of {max}")]
    PlaintextTooLong { len: usize, max: usize },

    #[error("Decryption produced an invalid plaintext: {0}")]
    Decode(String),

    #[error("Invalid group element encoding")]
    InvalidPoint,

    #[error("Invalid signature")]
    InvalidSignature,
}
