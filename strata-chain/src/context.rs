//! Validation contexts.

use strata_core::{Address, Hash256, ZERO_HASH};

/// The chain tip a candidate block must extend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockchainContext {
    /// Height of the current tip.
    pub tip_height: u64,
    /// Hash of the current tip.
    pub tip_hash: Hash256,
}

impl BlockchainContext {
    /// Context for extending the tip at `tip_height` with hash `tip_hash`.
    pub fn new(tip_height: u64, tip_hash: Hash256) -> Self {
        Self { tip_height, tip_hash }
    }

    /// Context of an empty chain.
    pub fn empty() -> Self {
        Self::new(0, ZERO_HASH)
    }
}

/// Context handed to every per-action validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionContext {
    /// Sender address derived from the envelope's public key.
    pub caller: Address,
    /// Height of the block containing the action.
    pub block_height: u64,
}
