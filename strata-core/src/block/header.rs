//! Block header structure.

use serde::{Deserialize, Serialize};

use crate::crypto::{sha256, Hash256, KeyPair, PublicKey, Signature};
use crate::error::CryptoError;
use crate::serialization::serialize;

/// Block header containing metadata, commitments and the producer's signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version (currently 1).
    pub version: u32,

    /// Block height (0 for genesis).
    pub height: u64,

    /// Unix timestamp in seconds.
    pub timestamp: u64,

    /// Hash of the previous block.
    /// [`crate::ZERO_HASH`] for the genesis block.
    pub prev_hash: Hash256,

    /// Merkle root of the action hashes in the body.
    pub tx_root: Hash256,

    /// Digest of the state changes applied by this block.
    pub delta_state_digest: Hash256,

    /// Merkle root of the receipts produced by this block.
    pub receipt_root: Hash256,

    /// Public key of the producer.
    pub producer: PublicKey,

    /// Producer signature over [`BlockHeader::hash`].
    pub signature: Signature,
}

/// Header fields covered by the hash; everything except the signature.
#[derive(Serialize)]
struct HeaderCore<'a> {
    version: u32,
    height: u64,
    timestamp: u64,
    prev_hash: &'a Hash256,
    tx_root: &'a Hash256,
    delta_state_digest: &'a Hash256,
    receipt_root: &'a Hash256,
    producer: &'a PublicKey,
}

impl BlockHeader {
    /// Protocol version number.
    pub const VERSION: u32 = 1;

    /// Compute the block hash.
    ///
    /// The hash is SHA-256 of the serialized header core. The signature is
    /// excluded so that it can sign the hash.
    pub fn hash(&self) -> Hash256 {
        let core = HeaderCore {
            version: self.version,
            height: self.height,
            timestamp: self.timestamp,
            prev_hash: &self.prev_hash,
            tx_root: &self.tx_root,
            delta_state_digest: &self.delta_state_digest,
            receipt_root: &self.receipt_root,
            producer: &self.producer,
        };
        let bytes = serialize(&core).expect("BlockHeader serialization should not fail");
        sha256(&bytes)
    }

    /// Set the producer key and sign the header hash with it.
    pub fn sign(&mut self, producer: &KeyPair) {
        self.producer = producer.public_key();
        self.signature = producer.sign(&self.hash());
    }

    /// Verify the producer signature.
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        self.producer.verify(&self.hash(), &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ZERO_HASH;

    fn test_header(kp: &KeyPair) -> BlockHeader {
        let mut header = BlockHeader {
            version: BlockHeader::VERSION,
            height: 5,
            timestamp: 1_700_000_000,
            prev_hash: [0xAB; 32],
            tx_root: ZERO_HASH,
            delta_state_digest: [1u8; 32],
            receipt_root: [2u8; 32],
            producer: kp.public_key(),
            signature: Signature::empty(),
        };
        header.sign(kp);
        header
    }

    #[test]
    fn test_hash_excludes_signature() {
        let kp = KeyPair::generate();
        let mut header = test_header(&kp);
        let hash = header.hash();

        header.signature = Signature::empty();
        assert_eq!(header.hash(), hash);
    }

    #[test]
    fn test_hash_changes_with_any_core_field() {
        let kp = KeyPair::generate();
        let baseline = test_header(&kp);
        let baseline_hash = baseline.hash();

        let mut h = baseline.clone();
        h.height = 6;
        assert_ne!(h.hash(), baseline_hash);

        let mut h = baseline.clone();
        h.prev_hash = [0xCD; 32];
        assert_ne!(h.hash(), baseline_hash);

        let mut h = baseline.clone();
        h.tx_root = [3u8; 32];
        assert_ne!(h.hash(), baseline_hash);

        let mut h = baseline.clone();
        h.producer = KeyPair::generate().public_key();
        assert_ne!(h.hash(), baseline_hash);
    }

    #[test]
    fn test_signature_verifies() {
        let kp = KeyPair::generate();
        assert!(test_header(&kp).verify_signature().is_ok());
    }

    #[test]
    fn test_modified_header_fails_verification() {
        let kp = KeyPair::generate();
        let mut header = test_header(&kp);
        header.timestamp += 1;
        assert!(header.verify_signature().is_err());
    }
}
