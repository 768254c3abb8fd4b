//! Full block: header, body and footer.

use serde::{Deserialize, Serialize};

use crate::action::SealedEnvelope;
use crate::block::{BlockBody, BlockFooter, BlockHeader};
use crate::crypto::Hash256;
use crate::error::CryptoError;

/// A block as produced by consensus and persisted by the block store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header with metadata, commitments and producer signature.
    pub header: BlockHeader,

    /// Ordered actions.
    pub body: BlockBody,

    /// Commit data.
    pub footer: BlockFooter,
}

impl Block {
    /// Assemble a block from its three parts.
    pub fn new(header: BlockHeader, body: BlockBody, footer: BlockFooter) -> Self {
        Block { header, body, footer }
    }

    /// Get the block hash (delegates to header).
    #[inline]
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    /// Get the block height.
    #[inline]
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Hash of the parent block.
    #[inline]
    pub fn prev_hash(&self) -> Hash256 {
        self.header.prev_hash
    }

    /// Actions in body order.
    #[inline]
    pub fn actions(&self) -> &[SealedEnvelope] {
        &self.body.actions
    }

    /// Recompute the Merkle root of the body's action hashes.
    pub fn compute_tx_root(&self) -> Hash256 {
        self.body.tx_root()
    }

    /// Verify that the header's tx_root matches the body.
    pub fn verify_tx_root(&self) -> bool {
        self.header.tx_root == self.compute_tx_root()
    }

    /// Verify the producer signature on the header.
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        self.header.verify_signature()
    }
}
