//! Signed envelope wrapper.

use serde::{Deserialize, Serialize};

use super::envelope::{Action, Envelope};
use crate::crypto::{sha256, Address, Hash256, PublicKey, Signature};
use crate::error::CryptoError;
use crate::serialization::serialize;

/// A signed, hash-addressable action ready for block inclusion.
///
/// The sender address is not stored; it is derived from `src_pubkey`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// The signed envelope.
    pub envelope: Envelope,

    /// Public key of the sender.
    pub src_pubkey: PublicKey,

    /// Ed25519 signature over the serialized envelope.
    pub signature: Signature,
}

impl SealedEnvelope {
    /// Compute the action hash.
    ///
    /// The hash is SHA-256 of the serialized sealed envelope.
    pub fn hash(&self) -> Hash256 {
        let bytes = serialize(self).expect("SealedEnvelope serialization should not fail");
        sha256(&bytes)
    }

    /// Address of the sender.
    pub fn sender(&self) -> Address {
        self.src_pubkey.address()
    }

    /// Sender nonce.
    #[inline]
    pub fn nonce(&self) -> u64 {
        self.envelope.nonce
    }

    /// Gas limit of the envelope.
    #[inline]
    pub fn gas_limit(&self) -> u64 {
        self.envelope.gas_limit
    }

    /// The action payload.
    #[inline]
    pub fn action(&self) -> &Action {
        &self.envelope.payload
    }

    /// Intrinsic gas of the payload, `None` on overflow.
    pub fn intrinsic_gas(&self) -> Option<u64> {
        self.envelope.payload.intrinsic_gas()
    }

    /// Check the signature against the sender key.
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        self.src_pubkey.verify(&self.envelope.signing_bytes(), &self.signature)
    }
}
