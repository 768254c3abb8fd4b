//! Action payloads and the unsigned envelope around them.

use serde::{Deserialize, Serialize};

use super::sealed::SealedEnvelope;
use crate::crypto::{Address, KeyPair};
use crate::serialization::serialize;

/// Gas charged for every transfer or execution regardless of its size.
pub const BASE_INTRINSIC_GAS: u64 = 10_000;

/// Gas charged per payload or call-data byte.
pub const PAYLOAD_GAS_PER_BYTE: u64 = 100;

/// Kind of reward a producer grants itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    /// Reward for producing a block.
    Block,
    /// Reward paid at the end of an epoch.
    Epoch,
}

/// Payload of an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Move funds between accounts.
    Transfer {
        /// Receiving account.
        recipient: Address,
        /// Amount in the smallest unit.
        amount: u128,
        /// Opaque payload attached to the transfer.
        payload: Vec<u8>,
    },
    /// Deploy (no contract) or call a contract.
    Execution {
        /// Called contract; `None` deploys `data` as a new contract.
        contract: Option<Address>,
        /// Amount sent along with the call.
        amount: u128,
        /// Call data or contract code.
        data: Vec<u8>,
    },
    /// Producer reward grant.
    GrantReward {
        /// Which reward is granted.
        kind: RewardKind,
        /// Height the reward is granted for.
        height: u64,
    },
}

impl Action {
    /// Gas consumed before any execution happens.
    ///
    /// Returns `None` if the cost overflows `u64`.
    pub fn intrinsic_gas(&self) -> Option<u64> {
        let data_len = match self {
            Action::Transfer { payload, .. } => payload.len(),
            Action::Execution { data, .. } => data.len(),
            Action::GrantReward { .. } => return Some(0),
        };
        (data_len as u64)
            .checked_mul(PAYLOAD_GAS_PER_BYTE)?
            .checked_add(BASE_INTRINSIC_GAS)
    }
}

/// Nonce and gas terms wrapped around an action payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope format version.
    pub version: u32,
    /// Sender nonce; zero means the action is not nonce-tracked.
    pub nonce: u64,
    /// Maximum gas the sender pays for.
    pub gas_limit: u64,
    /// Price per unit of gas.
    pub gas_price: u128,
    /// The action itself.
    pub payload: Action,
}

impl Envelope {
    /// Current envelope version.
    pub const VERSION: u32 = 1;

    /// Create a version-1 envelope.
    pub fn new(nonce: u64, gas_limit: u64, gas_price: u128, payload: Action) -> Self {
        Envelope {
            version: Self::VERSION,
            nonce,
            gas_limit,
            gas_price,
            payload,
        }
    }

    /// Bytes covered by the sender's signature.
    pub fn signing_bytes(&self) -> Vec<u8> {
        serialize(self).expect("Envelope serialization should not fail")
    }

    /// Sign the envelope, producing a sealed envelope ready for a block.
    pub fn seal(self, key_pair: &KeyPair) -> SealedEnvelope {
        let signature = key_pair.sign(&self.signing_bytes());
        SealedEnvelope {
            envelope: self,
            src_pubkey: key_pair.public_key(),
            signature,
        }
    }
}
