//! Schnorr signatures over ristretto255.
//!
//! Only the authority signs. Telecoms verify every query against the
//! authority's pinned verifying key before answering it.
//!
//! ```text
//! Sign(x, m):    v <- random, T = g^v, c = H(T, m), r = v - x·c
//! Verify(X, m):  T' = g^r · X^c, accept iff H(T', m) == c
//! ```

use super::keys::random_scalar;
use super::CryptoError;
use crate::crypto::elgamal::Ciphertext;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Domain separation tag for the challenge hash.
const CHALLENGE_DOMAIN: &[u8] = b"ppcc-schnorr-v1";

/// Authority signing key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Scalar);

impl SigningKey {
    /// Generate a fresh signing key.
    pub fn generate() -> Result<Self, CryptoError> {
        loop {
            let scalar = random_scalar()?;
            if scalar != Scalar::ZERO {
                return Ok(Self(scalar));
            }
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(RistrettoPoint::mul_base(&self.0))
    }

    /// Sign `message`.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        let v = random_scalar()?;
        let commitment = RistrettoPoint::mul_base(&v);
        let c = challenge(&commitment, message);
        let r = v - self.0 * c;
        Ok(Signature { c, r })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Public verification key (`g^x`).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey(RistrettoPoint);

impl VerifyingKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        CompressedRistretto(*bytes)
            .decompress()
            .map(Self)
            .ok_or(CryptoError::InvalidPoint)
    }

    /// Verify `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        // T' = r·G + c·X
        let commitment =
            RistrettoPoint::vartime_double_scalar_mul_basepoint(&signature.c, &self.0, &signature.r);

        if challenge(&commitment, message) == signature.c {
            Ok(())
        } else {
            Err(CryptoError::InvalidSignature)
        }
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKey({})", hex::encode(&self.to_bytes()[..8]))
    }
}

/// Signature `(c, r)`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    c: Scalar,
    r: Scalar,
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(self.c.as_bytes());
        out[32..].copy_from_slice(self.r.as_bytes());
        out
    }

    /// Parse a signature, rejecting non-canonical scalars.
    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self, CryptoError> {
        let mut c = [0u8; 32];
        let mut r = [0u8; 32];
        c.copy_from_slice(&bytes[..32]);
        r.copy_from_slice(&bytes[32..]);

        let c: Option<Scalar> = Scalar::from_canonical_bytes(c).into();
        let r: Option<Scalar> = Scalar::from_canonical_bytes(r).into();
        match (c, r) {
            (Some(c), Some(r)) => Ok(Self { c, r }),
            _ => Err(CryptoError::InvalidSignature),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.to_bytes()[..8]))
    }
}

fn challenge(commitment: &RistrettoPoint, message: &[u8]) -> Scalar {
    let digest = Sha512::new()
        .chain_update(CHALLENGE_DOMAIN)
        .chain_update(commitment.compress().as_bytes())
        .chain_update(message)
        .finalize();

    let mut wide = [0u8; 64];
    wide.copy_from_slice(&digest);
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// Bytes covered by a query signature.
///
/// Fixed order: encrypted payload, destination owner index, remaining depth.
pub fn query_signing_bytes(payload: &Ciphertext, destination: usize, depth: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(64 + 16);
    bytes.extend_from_slice(&payload.to_bytes());
    bytes.extend_from_slice(&(destination as u64).to_be_bytes());
    bytes.extend_from_slice(&u64::from(depth).to_be_bytes());
    bytes
}
