//! Error types for the Strata core crate.

use std::fmt;

/// Failures verifying keys and signatures carried by blocks and envelopes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// 32 bytes that are not a valid Ed25519 point.
    MalformedKey,
    /// The signature does not match the message under the given key.
    BadSignature,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CryptoError::MalformedKey => "malformed ed25519 public key",
            CryptoError::BadSignature => "bad ed25519 signature",
        })
    }
}

impl std::error::Error for CryptoError {}

/// Failures of the ledger's binary encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SerializationError {
    /// The value could not be encoded.
    Encode(String),
    /// The bytes are not a valid encoding of the requested type.
    Decode(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::Encode(reason) => write!(f, "cannot encode: {reason}"),
            SerializationError::Decode(reason) => write!(f, "cannot decode: {reason}"),
        }
    }
}

impl std::error::Error for SerializationError {}
