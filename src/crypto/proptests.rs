//! Property-based tests for the cryptographic primitives
//!
//! Tests for:
//! - ElGamal: roundtrip, randomization, remainder handling
//! - Schnorr: soundness, tamper detection, key isolation
//!
//! Curve operations are comparatively slow, so case counts are kept low.

use super::elgamal::{decrypt, encrypt, EMBED_CAPACITY};
use super::keys::KeyPair;
use super::schnorr::SigningKey;
use super::{decrypt_identifier, encrypt_identifier};
use proptest::prelude::*;
use proptest::test_runner::{RngAlgorithm, TestRng, TestRunner};

// Fixed seed for deterministic property tests (32 bytes for ChaCha RNG)
const PROPTEST_SEED: &str = "ppcc-crypto-proptest-seed-32byte";

fn seeded_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        rng_algorithm: RngAlgorithm::ChaCha,
        ..Default::default()
    };
    TestRunner::new_with_rng(
        config,
        TestRng::from_seed(RngAlgorithm::ChaCha, PROPTEST_SEED.as_bytes()),
    )
}

/// Property: Decrypt(priv, Encrypt(pub, P)) == P
#[test]
fn prop_encryption_roundtrip() {
    let mut runner = seeded_runner(48);
    let strategy = prop::collection::vec(any::<u8>(), 0..=EMBED_CAPACITY);

    runner
        .run(&strategy, |plaintext| {
            let pair = KeyPair::generate().unwrap();
            let (ct, remainder) = encrypt(&pair.public(), &plaintext).unwrap();

            prop_assert!(remainder.is_empty());
            prop_assert_eq!(decrypt(pair.secret(), &ct).unwrap(), plaintext);
            Ok(())
        })
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: identifier roundtrip for any string that fits one point
    #[test]
    fn identifier_roundtrip(identifier in "[0-9A-Za-z+]{0,28}") {
        let pair = KeyPair::generate().unwrap();
        let ct = encrypt_identifier(&pair.public(), &identifier).unwrap();
        prop_assert_eq!(decrypt_identifier(pair.secret(), &ct).unwrap(), identifier);
    }

    /// Property: encryption is randomized
    /// Two encryptions of the same plaintext under the same key differ
    #[test]
    fn encryption_non_determinism(identifier in "[0-9]{10}") {
        let pair = KeyPair::generate().unwrap();
        let ct1 = encrypt_identifier(&pair.public(), &identifier).unwrap();
        let ct2 = encrypt_identifier(&pair.public(), &identifier).unwrap();
        prop_assert_ne!(ct1, ct2, "Fresh randomness must be drawn per call");
    }

    /// Property: oversized plaintexts hand back exactly the excess
    #[test]
    fn remainder_is_excess(extra in 1usize..64) {
        let pair = KeyPair::generate().unwrap();
        let plaintext = vec![0x41u8; EMBED_CAPACITY + extra];
        let (ct, remainder) = encrypt(&pair.public(), &plaintext).unwrap();

        prop_assert_eq!(remainder, &plaintext[EMBED_CAPACITY..]);
        prop_assert_eq!(decrypt(pair.secret(), &ct).unwrap(), plaintext[..EMBED_CAPACITY].to_vec());
    }

    /// Property: Verify(pub, msg, Sign(priv, msg)) succeeds
    #[test]
    fn signature_soundness(message in prop::collection::vec(any::<u8>(), 0..256)) {
        let key = SigningKey::generate().unwrap();
        let sig = key.sign(&message).unwrap();
        prop_assert!(key.verifying_key().verify(&message, &sig).is_ok());
    }

    /// Property: altering any byte of the message breaks verification
    #[test]
    fn signature_detects_tampering(
        message in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let key = SigningKey::generate().unwrap();
        let sig = key.sign(&message).unwrap();

        let mut tampered = message.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= flip;

        prop_assert!(key.verifying_key().verify(&tampered, &sig).is_err());
    }

    /// Property: a signature from a different key pair is rejected
    #[test]
    fn signature_key_isolation(message in prop::collection::vec(any::<u8>(), 0..128)) {
        let key = SigningKey::generate().unwrap();
        let other = SigningKey::generate().unwrap();
        let sig = other.sign(&message).unwrap();
        prop_assert!(key.verifying_key().verify(&message, &sig).is_err());
    }
}
