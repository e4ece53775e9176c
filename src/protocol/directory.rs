//! Public key directory shared by all participants.
//!
//! Key distribution happens before a round starts; the protocol assumes
//! every node already holds this directory and its own secret keys.

use super::error::{ProtocolError, ProtocolResult};
use crate::crypto::{CryptoError, KeyPair, PublicKey, SigningKey, VerifyingKey};

/// Public keys of every participant, indexed by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDirectory {
    authority: PublicKey,
    authority_verifying_key: VerifyingKey,
    telecoms: Vec<PublicKey>,
}

impl KeyDirectory {
    pub fn new(
        authority: PublicKey,
        authority_verifying_key: VerifyingKey,
        telecoms: Vec<PublicKey>,
    ) -> Self {
        Self {
            authority,
            authority_verifying_key,
            telecoms,
        }
    }

    pub fn authority(&self) -> &PublicKey {
        &self.authority
    }

    /// Pinned verifying key for query signatures.
    pub fn authority_verifying_key(&self) -> &VerifyingKey {
        &self.authority_verifying_key
    }

    /// Encryption key of telecom `index`.
    pub fn telecom(&self, index: usize) -> ProtocolResult<&PublicKey> {
        self.telecoms
            .get(index)
            .ok_or(ProtocolError::InvalidDestination {
                index,
                telecoms: self.telecoms.len(),
            })
    }

    pub fn telecom_count(&self) -> usize {
        self.telecoms.len()
    }
}

/// Secret material for one round, plus the directory built from it.
#[derive(Debug)]
pub struct RoundKeys {
    pub directory: KeyDirectory,
    pub authority: KeyPair,
    pub signing_key: SigningKey,
    pub telecoms: Vec<KeyPair>,
}

impl RoundKeys {
    /// Generate fresh keys for an authority and `telecoms` telecoms.
    pub fn generate(telecoms: usize) -> Result<Self, CryptoError> {
        let authority = KeyPair::generate()?;
        let signing_key = SigningKey::generate()?;
        let telecoms = (0..telecoms)
            .map(|_| KeyPair::generate())
            .collect::<Result<Vec<_>, _>>()?;

        let directory = KeyDirectory::new(
            authority.public(),
            signing_key.verifying_key(),
            telecoms.iter().map(KeyPair::public).collect(),
        );

        Ok(Self {
            directory,
            authority,
            signing_key,
            telecoms,
        })
    }
}
