//! Block body: the ordered actions of a block.

use serde::{Deserialize, Serialize};

use crate::action::SealedEnvelope;
use crate::crypto::{merkle_root, Hash256};

/// Ordered sealed envelopes included in a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    /// Actions in execution order.
    pub actions: Vec<SealedEnvelope>,
}

impl BlockBody {
    /// Wrap an ordered list of actions.
    pub fn new(actions: Vec<SealedEnvelope>) -> Self {
        BlockBody { actions }
    }

    /// Hashes of the actions, in body order.
    pub fn action_hashes(&self) -> Vec<Hash256> {
        self.actions.iter().map(SealedEnvelope::hash).collect()
    }

    /// Merkle root of the action hashes.
    pub fn tx_root(&self) -> Hash256 {
        merkle_root(&self.action_hashes())
    }
}
