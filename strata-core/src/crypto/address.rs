//! Account address derivation.
//!
//! An address is the first 20 bytes of the SHA-256 hash of the Ed25519
//! public key. Senders are never stored with an action; the validator and
//! the envelope validators derive the address from the envelope's key.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::hashing::sha256;
use super::keys::PublicKey;

/// 20-byte account address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Derive the address owned by a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let hash = sha256(public_key.as_bytes());
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[..20]);
        Address(address)
    }

    /// Raw address bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
