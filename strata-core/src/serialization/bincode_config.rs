//! Deterministic bincode configuration.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::SerializationError;

/// Fixed-size little-endian integers; trailing bytes are rejected on decode.
fn config() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Serialize a value to bytes using the ledger encoding.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    config()
        .serialize(value)
        .map_err(|e| SerializationError::Encode(e.to_string()))
}

/// Deserialize a value from bytes.
///
/// Fails on malformed input, on a type mismatch, and when bytes remain
/// after the value has been read. A truncated or corrupted stored record
/// therefore never decodes silently.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    config()
        .deserialize(bytes)
        .map_err(|e| SerializationError::Decode(e.to_string()))
}

/// Get the encoded size of a value without allocating the buffer.
pub fn serialized_size<T: Serialize>(value: &T) -> Result<u64, SerializationError> {
    config()
        .serialized_size(value)
        .map_err(|e| SerializationError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Record {
        height: u64,
        hash: [u8; 32],
        contract: Option<[u8; 20]>,
    }

    fn record() -> Record {
        Record {
            height: 42,
            hash: [7u8; 32],
            contract: Some([1u8; 20]),
        }
    }

    #[test]
    fn test_same_value_same_bytes() {
        assert_eq!(serialize(&record()).unwrap(), serialize(&record()).unwrap());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = serialize(&record()).unwrap();
        bytes.push(0xFF);

        let result: Result<Record, _> = deserialize(&bytes);
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }

    #[test]
    fn test_rejects_truncated_input() {
        let bytes = serialize(&record()).unwrap();
        let result: Result<Record, _> = deserialize(&bytes[..bytes.len() - 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_integers_are_fixed_width_little_endian() {
        assert_eq!(serialize(&1u64).unwrap().len(), 8);
        assert_eq!(serialize(&0x01020304u32).unwrap(), vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_serialized_size_matches_encoding() {
        let size = serialized_size(&record()).unwrap();
        assert_eq!(size, serialize(&record()).unwrap().len() as u64);
    }
}
