//! Block production.
//!
//! Provides a builder that assembles candidate blocks on top of the tip.

use std::collections::HashSet;

use strata_core::{
    Block, BlockBody, BlockFooter, BlockHeader, Hash256, KeyPair, SealedEnvelope, Signature, ZERO_HASH,
};
use tracing::debug;

use crate::context::BlockchainContext;
use crate::error::{ChainError, ChainResult};

/// Builder for constructing new blocks.
pub struct BlockBuilder {
    /// Block height.
    height: u64,

    /// Parent block hash.
    prev_hash: Hash256,

    /// Block timestamp.
    timestamp: u64,

    /// Actions to include, in order.
    actions: Vec<SealedEnvelope>,

    /// Hashes of included actions.
    seen: HashSet<Hash256>,

    delta_state_digest: Hash256,
    receipt_root: Hash256,
}

impl BlockBuilder {
    /// Create a builder for the block extending the tip in `ctx`.
    pub fn new(ctx: &BlockchainContext, timestamp: u64) -> Self {
        Self::at(ctx.tip_height.saturating_add(1), ctx.tip_hash, timestamp)
    }

    /// Create a builder for the genesis block.
    pub fn genesis(timestamp: u64) -> Self {
        Self::at(0, ZERO_HASH, timestamp)
    }

    fn at(height: u64, prev_hash: Hash256, timestamp: u64) -> Self {
        Self {
            height,
            prev_hash,
            timestamp,
            actions: Vec::new(),
            seen: HashSet::new(),
            delta_state_digest: ZERO_HASH,
            receipt_root: ZERO_HASH,
        }
    }

    /// Add an action to the block.
    ///
    /// The envelope signature is checked before the action is added; an
    /// action already in the block is rejected.
    pub fn add_action(&mut self, selp: SealedEnvelope) -> ChainResult<()> {
        let action_hash = selp.hash();
        if selp.verify_signature().is_err() {
            return Err(ChainError::InvalidActionSignature { action_hash });
        }
        if !self.seen.insert(action_hash) {
            return Err(ChainError::ActionValidation {
                action_hash,
                error: "action already included".to_string(),
            });
        }
        self.actions.push(selp);
        Ok(())
    }

    /// Add multiple actions, skipping invalid ones.
    ///
    /// Returns the number of actions added.
    pub fn add_actions(&mut self, actions: impl IntoIterator<Item = SealedEnvelope>) -> usize {
        let mut added = 0;
        for selp in actions {
            if self.add_action(selp).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Get the number of actions.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Set the digest of the state changes this block applies.
    pub fn delta_state_digest(mut self, digest: Hash256) -> Self {
        self.delta_state_digest = digest;
        self
    }

    /// Set the Merkle root of the receipts this block produces.
    pub fn receipt_root(mut self, root: Hash256) -> Self {
        self.receipt_root = root;
        self
    }

    /// Build the block and sign its header with `producer`.
    pub fn build(self, producer: &KeyPair) -> Block {
        let body = BlockBody::new(self.actions);
        let mut header = BlockHeader {
            version: BlockHeader::VERSION,
            height: self.height,
            timestamp: self.timestamp,
            prev_hash: self.prev_hash,
            tx_root: body.tx_root(),
            delta_state_digest: self.delta_state_digest,
            receipt_root: self.receipt_root,
            producer: producer.public_key(),
            signature: Signature::empty(),
        };
        header.sign(producer);

        let footer = BlockFooter {
            commit_time: self.timestamp,
            endorsements: Vec::new(),
        };
        debug!(height = self.height, actions = body.actions.len(), "built block");
        Block::new(header, body, footer)
    }
}
