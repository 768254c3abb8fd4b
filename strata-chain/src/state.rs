//! Read access to committed state and to the pending action pool.

use std::collections::HashMap;

use parking_lot::RwLock;
use strata_core::{Address, Hash256, SealedEnvelope};

use crate::error::ChainResult;

/// Committed account state the validator checks nonces against.
pub trait StateReader: Send + Sync {
    /// Last nonce reflected in committed state; 0 for unknown accounts.
    fn confirmed_nonce(&self, address: &Address) -> ChainResult<u64>;
}

/// Pool of actions that were validated on admission.
pub trait ActPool: Send + Sync {
    /// The pooled action with this hash, if any.
    fn get_action_by_hash(&self, hash: &Hash256) -> Option<SealedEnvelope>;
}

/// In-memory confirmed nonces.
#[derive(Debug, Default)]
pub struct NonceTable {
    nonces: RwLock<HashMap<Address, u64>>,
}

impl NonceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the confirmed nonce of `address`.
    pub fn set(&self, address: Address, nonce: u64) {
        self.nonces.write().insert(address, nonce);
    }
}

impl StateReader for NonceTable {
    fn confirmed_nonce(&self, address: &Address) -> ChainResult<u64> {
        Ok(self.nonces.read().get(address).copied().unwrap_or(0))
    }
}
