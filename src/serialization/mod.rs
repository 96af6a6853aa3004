//! CBOR serialization for vault state snapshots.
//!
//! Snapshots are encoded with `ciborium`. New fields must carry
//! `#[serde(default)]` so older snapshots keep decoding.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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
    use crate::membership::{Membership, Principal};
    use serde::Deserialize;

    #[test]
    fn test_membership_survives_cbor() {
        let signers = vec![Principal::new("a").unwrap(), Principal::new("b").unwrap()];
        let original = Membership::new(signers, 2).unwrap();
        let bytes = to_cbor(&original).unwrap();
        let recovered: Membership = from_cbor(&bytes).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_cbor_deterministic() {
        let m = Membership::new(vec![Principal::new("x").unwrap()], 1).unwrap();
        assert_eq!(to_cbor(&m).unwrap(), to_cbor(&m).unwrap());
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let result: Result<Membership, _> = from_cbor(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }

    #[test]
    fn test_added_field_defaults_when_absent() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct V1 {
            threshold: u32,
        }

        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct V2 {
            threshold: u32,
            #[serde(default)]
            note: Option<String>,
        }

        let bytes = to_cbor(&V1 { threshold: 2 }).unwrap();
        let v2: V2 = from_cbor(&bytes).unwrap();
        assert_eq!(v2.threshold, 2);
        assert_eq!(v2.note, None);
    }
}
