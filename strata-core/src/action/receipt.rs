//! Execution receipts.

use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Hash256};

/// Outcome of executing one action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Execution failed; gas was still consumed.
    Failure,
    /// Execution succeeded.
    Success,
}

/// Event emitted while executing an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting account or contract.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash256>,
    /// Unindexed data.
    pub data: Vec<u8>,
    /// Height of the block the action was included in.
    pub block_height: u64,
    /// Hash of the emitting action.
    pub action_hash: Hash256,
    /// Position of the log within the block.
    pub index: u32,
}

/// Recorded result of one action's execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Execution status.
    pub status: ReceiptStatus,
    /// Height of the owning block.
    pub block_height: u64,
    /// Hash of the executed action.
    pub action_hash: Hash256,
    /// Gas consumed, including intrinsic gas.
    pub gas_consumed: u64,
    /// Address of the contract created by a deployment.
    pub contract_address: Option<Address>,
    /// Emitted logs.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Receipt for a successful action without logs.
    pub fn success(block_height: u64, action_hash: Hash256, gas_consumed: u64) -> Self {
        Receipt {
            status: ReceiptStatus::Success,
            block_height,
            action_hash,
            gas_consumed,
            contract_address: None,
            logs: Vec::new(),
        }
    }

    /// Whether the action executed successfully.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}
