//! Key material for the contact-chaining protocol.
//!
//! Every participant owns one ElGamal key pair over ristretto255. The
//! public halves are distributed out of band (see `protocol::directory::KeyDirectory`);
//! the secret scalar never leaves its owner and is zeroized on drop.

use super::CryptoError;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Draw a uniformly random scalar.
///
/// 64 bytes from the system RNG are reduced modulo the group order so the
/// result carries no measurable bias.
pub fn random_scalar() -> Result<Scalar, CryptoError> {
    let rng = SystemRandom::new();
    let mut wide = [0u8; 64];
    rng.fill(&mut wide)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    let scalar = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();
    Ok(scalar)
}

/// Secret decryption key (a non-zero scalar).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Scalar);

impl SecretKey {
    /// Generate a fresh secret key.
    pub fn generate() -> Result<Self, CryptoError> {
        loop {
            let scalar = random_scalar()?;
            if scalar != Scalar::ZERO {
                return Ok(Self(scalar));
            }
        }
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(RistrettoPoint::mul_base(&self.0))
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Public encryption key (`g^x`).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(RistrettoPoint);

impl PublicKey {
    /// Compressed 32-byte encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    /// Parse a compressed encoding.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        CompressedRistretto(*bytes)
            .decompress()
            .map(Self)
            .ok_or(CryptoError::InvalidPoint)
    }

    pub(crate) fn point(&self) -> &RistrettoPoint {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl fmt::Display for PublicKey {
    /// Short fingerprint, enough to tell keys apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.to_bytes()[..8]))
    }
}

/// A participant's ElGamal key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new key pair.
    pub fn generate() -> Result<Self, CryptoError> {
        let secret = SecretKey::generate()?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public(&self) -> PublicKey {
        self.public
    }
}
