//! Block footer: commit data collected after a block is agreed on.

use serde::{Deserialize, Serialize};

use crate::crypto::{Hash256, KeyPair, PublicKey, Signature};
use crate::error::CryptoError;

/// A consensus participant's endorsement of a block hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Unix timestamp of the endorsement.
    pub timestamp: u64,
    /// Endorser public key.
    pub endorser: PublicKey,
    /// Signature over `block_hash || timestamp`.
    pub signature: Signature,
}

impl Endorsement {
    /// Endorse a block hash.
    pub fn new(endorser: &KeyPair, block_hash: &Hash256, timestamp: u64) -> Self {
        let message = Self::message(block_hash, timestamp);
        Endorsement {
            timestamp,
            endorser: endorser.public_key(),
            signature: endorser.sign(&message),
        }
    }

    /// Verify the endorsement against the block hash it claims to endorse.
    pub fn verify(&self, block_hash: &Hash256) -> Result<(), CryptoError> {
        let message = Self::message(block_hash, self.timestamp);
        self.endorser.verify(&message, &self.signature)
    }

    fn message(block_hash: &Hash256, timestamp: u64) -> Vec<u8> {
        let mut message = Vec::with_capacity(40);
        message.extend_from_slice(block_hash);
        message.extend_from_slice(&timestamp.to_le_bytes());
        message
    }
}

/// Commit time and endorsements of a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFooter {
    /// Unix timestamp at which the block was committed.
    pub commit_time: u64,
    /// Endorsements collected for the block.
    pub endorsements: Vec<Endorsement>,
}
