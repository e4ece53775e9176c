//! ElGamal encryption over ristretto255.
//!
//! # Construction
//!
//! - `Encrypt(pk, m)`: `K = g^r`, `C = M · pk^r` with a fresh `r` per call
//! - `Decrypt(x, K, C)`: `M = C / K^x`
//!
//! `M` is the plaintext embedded as a group element. An embedding holds up
//! to [`EMBED_CAPACITY`] bytes; longer input is split and the excess is
//! handed back to the caller as a remainder.
//!
//! # Embedding layout
//!
//! ```text
//! byte 0      counter (low 7 bits, shifted left so the encoding stays non-negative)
//! byte 1      payload length
//! bytes 2..30 payload, zero padded
//! byte 30     counter (high 8 bits)
//! byte 31     0 (keeps the field element canonical)
//! ```
//!
//! The counter is bumped until the bytes form a valid ristretto encoding.
//! Each candidate succeeds with probability ~1/4, so exhausting the 2^15
//! candidates does not happen in practice.

use super::keys::{random_scalar, PublicKey, SecretKey};
use super::CryptoError;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of plaintext bytes carried by one group element.
pub const EMBED_CAPACITY: usize = 28;

/// Counter space for the try-and-increment embedding.
const MAX_EMBED_ATTEMPTS: u16 = 1 << 15;

/// Length marker offset within the encoding.
const LEN_OFFSET: usize = 1;

/// Payload offset within the encoding.
const DATA_OFFSET: usize = 2;

/// An ElGamal ciphertext `(K, C)`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    k: RistrettoPoint,
    c: RistrettoPoint,
}

impl Ciphertext {
    /// Byte representation `compress(K) ‖ compress(C)`.
    ///
    /// This is the representation covered by query signatures.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(self.k.compress().as_bytes());
        out[32..].copy_from_slice(self.c.compress().as_bytes());
        out
    }

    /// Parse `compress(K) ‖ compress(C)`.
    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self, CryptoError> {
        let mut k = [0u8; 32];
        let mut c = [0u8; 32];
        k.copy_from_slice(&bytes[..32]);
        c.copy_from_slice(&bytes[32..]);

        let k = CompressedRistretto(k)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;
        let c = CompressedRistretto(c)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;
        Ok(Self { k, c })
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        write!(
            f,
            "Ciphertext(K={}.., C={}..)",
            hex::encode(&bytes[..6]),
            hex::encode(&bytes[32..38])
        )
    }
}

/// Embed up to [`EMBED_CAPACITY`] bytes of `data` into a group element.
///
/// Returns the point and whatever part of `data` did not fit.
pub fn embed(data: &[u8]) -> Result<(RistrettoPoint, &[u8]), CryptoError> {
    let take = data.len().min(EMBED_CAPACITY);
    let (head, remainder) = data.split_at(take);

    let mut encoding = [0u8; 32];
    encoding[LEN_OFFSET] = take as u8;
    encoding[DATA_OFFSET..DATA_OFFSET + take].copy_from_slice(head);

    for counter in 0..MAX_EMBED_ATTEMPTS {
        encoding[0] = ((counter & 0x7f) as u8) << 1;
        encoding[30] = (counter >> 7) as u8;

        if let Some(point) = CompressedRistretto(encoding).decompress() {
            return Ok((point, remainder));
        }
    }

    Err(CryptoError::Embedding)
}

/// Recover the bytes embedded by [`embed`].
pub fn extract(point: &RistrettoPoint) -> Result<Vec<u8>, CryptoError> {
    let encoding = point.compress().to_bytes();

    if encoding[31] != 0 {
        return Err(CryptoError::Decode("trailing byte not zero".to_string()));
    }

    let len = encoding[LEN_OFFSET] as usize;
    if len > EMBED_CAPACITY {
        return Err(CryptoError::Decode(format!(
            "embedded length {} exceeds capacity {}",
            len, EMBED_CAPACITY
        )));
    }

    let padding = &encoding[DATA_OFFSET + len..DATA_OFFSET + EMBED_CAPACITY];
    if padding.iter().any(|b| *b != 0) {
        return Err(CryptoError::Decode("non-zero padding".to_string()));
    }

    Ok(encoding[DATA_OFFSET..DATA_OFFSET + len].to_vec())
}

/// Encrypt `plaintext` under `public`.
///
/// Draws fresh randomness on every call. Bytes beyond [`EMBED_CAPACITY`]
/// are returned unencrypted as the remainder.
pub fn encrypt<'a>(
    public: &PublicKey,
    plaintext: &'a [u8],
) -> Result<(Ciphertext, &'a [u8]), CryptoError> {
    let (message, remainder) = embed(plaintext)?;
    let r = random_scalar()?;

    let k = RistrettoPoint::mul_base(&r);
    let c = message + public.point() * r;

    Ok((Ciphertext { k, c }, remainder))
}

/// Decrypt a ciphertext with `secret`.
pub fn decrypt(secret: &SecretKey, ciphertext: &Ciphertext) -> Result<Vec<u8>, CryptoError> {
    let message = ciphertext.c - ciphertext.k * secret.scalar();
    extract(&message)
}

/// Encrypt an identifier that must fit in a single ciphertext.
pub fn encrypt_identifier(public: &PublicKey, identifier: &str) -> Result<Ciphertext, CryptoError> {
    let (ciphertext, remainder) = encrypt(public, identifier.as_bytes())?;
    if !remainder.is_empty() {
        return Err(CryptoError::PlaintextTooLong {
            len: identifier.len(),
            max: EMBED_CAPACITY,
        });
    }
    Ok(ciphertext)
}

/// Decrypt a ciphertext produced by [`encrypt_identifier`].
pub fn decrypt_identifier(secret: &SecretKey, ciphertext: &Ciphertext) -> Result<String, CryptoError> {
    let bytes = decrypt(secret, ciphertext)?;
    String::from_utf8(bytes).map_err(|e| CryptoError::Decode(e.to_string()))
}

/// Move an identifier from our key to `recipient`'s key.
///
/// Decrypts under `secret` then encrypts under `recipient`; the plaintext
/// only exists inside this call.
pub fn reencrypt_identifier(
    secret: &SecretKey,
    recipient: &PublicKey,
    ciphertext: &Ciphertext,
) -> Result<Ciphertext, CryptoError> {
    let identifier = decrypt_identifier(secret, ciphertext)?;
    encrypt_identifier(recipient, &identifier)
}
