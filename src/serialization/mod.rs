//! CBOR wire encoding for protocol messages.
//!
//! - Use CBOR via `ciborium` (NOT JSON or bincode)
//! - Deterministic output for identical values
//! - Schema evolution with #[serde(default)]

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| SerializationError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::Warrant;
    use crate::graph::OwnerPair;
    use crate::protocol::messages::{Init, Message, RoundComplete};

    #[test]
    fn test_unit_messages_roundtrip() {
        for message in [Message::from(Init {}), Message::from(RoundComplete {})] {
            let bytes = to_cbor(&message).unwrap();
            let decoded: Message = from_cbor(&bytes).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_cbor_deterministic() {
        let pair = OwnerPair::new("1234567890", 2);
        assert_eq!(to_cbor(&pair).unwrap(), to_cbor(&pair).unwrap());
    }

    #[test]
    fn test_warrant_roundtrip() {
        let warrant = Warrant::seed("1234567890", 0, 3);
        let bytes = to_cbor(&warrant).unwrap();
        let decoded: Warrant = from_cbor(&bytes).unwrap();
        assert_eq!(decoded, warrant);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<Message, _> = from_cbor(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }

    #[test]
    fn test_cbor_backward_compatibility() {
        #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
        struct V1 {
            query_id: u64,
        }

        #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
        struct V2 {
            query_id: u64,
            #[serde(default)]
            round: Option<String>,
        }

        let bytes = to_cbor(&V1 { query_id: 42 }).unwrap();

        // V2 can deserialize V1 data with default for new field
        let v2: V2 = from_cbor(&bytes).unwrap();
        assert_eq!(v2.query_id, 42);
        assert_eq!(v2.round, None);
    }
}
