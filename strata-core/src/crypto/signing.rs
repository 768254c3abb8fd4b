//! Ed25519 signatures.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ed25519 signature, encoded as a length-prefixed 64-byte string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    /// Wrap raw signature bytes; validity is only checked on verify.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Signature(ed25519_dalek::Signature::from_bytes(bytes))
    }

    /// All-zero placeholder carried by a header before it is signed.
    pub fn empty() -> Self {
        Signature::from_bytes(&[0u8; 64])
    }

    /// Raw signature bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    pub(crate) fn inner(&self) -> &ed25519_dalek::Signature {
        &self.0
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(signature: ed25519_dalek::Signature) -> Self {
        Signature(signature)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fixed_bytes::<D, 64>(deserializer).map(|bytes| Signature::from_bytes(&bytes))
    }
}

/// Read a length-prefixed byte string that must be exactly `N` bytes long.
pub(crate) fn fixed_bytes<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    let bytes = Vec::<u8>::deserialize(deserializer)?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| D::Error::invalid_length(bytes.len(), &"a fixed-length key or signature"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::serialization::{deserialize, serialize};

    #[test]
    fn test_empty_signature_never_verifies() {
        let kp = KeyPair::generate();
        assert!(kp.public_key().verify(b"block hash", &Signature::empty()).is_err());
    }

    #[test]
    fn test_signature_survives_encoding() {
        let kp = KeyPair::generate();
        let signature = kp.sign(b"envelope");

        let recovered: Signature = deserialize(&serialize(&signature).unwrap()).unwrap();
        assert_eq!(recovered, signature);
        assert!(kp.public_key().verify(b"envelope", &recovered).is_ok());
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let bytes = serialize(&vec![0u8; 63]).unwrap();
        assert!(deserialize::<Signature>(&bytes).is_err());
    }
}
