//! Chain error types.

use std::fmt;

use strata_core::{Address, Hash256};

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that reject a candidate block or one of its actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainError {
    // Structural errors
    /// Block height is not tip height + 1.
    InvalidTipHeight { expected: u64, actual: u64 },

    /// Previous block hash is not the tip hash.
    InvalidPrevHash { expected: Hash256, actual: Hash256 },

    /// Producer signature does not verify against the declared key.
    InvalidSignature { producer: [u8; 32] },

    /// Declared tx root differs from the root of the body's action hashes.
    InvalidTxRoot { expected: Hash256, actual: Hash256 },

    // Action errors
    /// An action's sender is on the deny list.
    BlacklistedSender { address: Address },

    /// Intrinsic gas exceeds the envelope's gas limit (or overflows).
    InsufficientGas {
        action_hash: Hash256,
        intrinsic_gas: Option<u64>,
        gas_limit: u64,
    },

    /// Envelope signature does not verify against its source key.
    InvalidActionSignature { action_hash: Hash256 },

    /// Non-zero nonce at or below the sender's confirmed nonce.
    NonceTooLow { action_hash: Hash256, nonce: u64, pending: u64 },

    /// A protocol or envelope validator rejected the action.
    ActionValidation { action_hash: Hash256, error: String },

    /// A sender's nonces in the block do not continue its confirmed nonce.
    InvalidNonce {
        sender: Address,
        index: usize,
        nonce: u64,
        expected: u64,
    },

    // Registry errors
    /// A protocol with the same id is already registered.
    DuplicateProtocol { id: String },

    // State errors
    /// The state reader failed.
    State(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::InvalidTipHeight { expected, actual } => {
                write!(f, "invalid tip height: wrong block height {actual}, expecting {expected}")
            }
            ChainError::InvalidPrevHash { expected, actual } => {
                write!(
                    f,
                    "invalid prev hash: expected {}, got {}",
                    hex(&expected[..4]),
                    hex(&actual[..4])
                )
            }
            ChainError::InvalidSignature { producer } => {
                write!(f, "invalid block signature from producer {}", hex(&producer[..4]))
            }
            ChainError::InvalidTxRoot { expected, actual } => {
                write!(
                    f,
                    "invalid tx_root: expected {}, got {}",
                    hex(&expected[..4]),
                    hex(&actual[..4])
                )
            }
            ChainError::BlacklistedSender { address } => {
                write!(f, "action source address {address} is blacklisted")
            }
            ChainError::InsufficientGas {
                action_hash,
                intrinsic_gas,
                gas_limit,
            } => match intrinsic_gas {
                Some(gas) => write!(
                    f,
                    "action {}: intrinsic gas {gas} exceeds gas limit {gas_limit}",
                    hex(&action_hash[..4])
                ),
                None => write!(f, "action {}: intrinsic gas overflows", hex(&action_hash[..4])),
            },
            ChainError::InvalidActionSignature { action_hash } => {
                write!(f, "action {}: invalid signature", hex(&action_hash[..4]))
            }
            ChainError::NonceTooLow {
                action_hash,
                nonce,
                pending,
            } => {
                write!(
                    f,
                    "action {}: nonce {nonce} is too low (pending nonce {pending})",
                    hex(&action_hash[..4])
                )
            }
            ChainError::ActionValidation { action_hash, error } => {
                write!(f, "action {} failed validation: {error}", hex(&action_hash[..4]))
            }
            ChainError::InvalidNonce {
                sender,
                index,
                nonce,
                expected,
            } => {
                write!(
                    f,
                    "the {index} nonce {nonce} of address {sender} is not continuously increasing (expected {expected})"
                )
            }
            ChainError::DuplicateProtocol { id } => {
                write!(f, "protocol {id} is already registered")
            }
            ChainError::State(error) => {
                write!(f, "state error: {error}")
            }
        }
    }
}

impl std::error::Error for ChainError {}

/// Helper to format bytes as hex.
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChainError::InvalidTipHeight {
            expected: 5,
            actual: 7,
        };
        assert!(err.to_string().contains("height"));
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_nonce_error_names_sender() {
        let sender = Address([0xAB; 20]);
        let err = ChainError::InvalidNonce {
            sender,
            index: 1,
            nonce: 9,
            expected: 4,
        };
        let message = err.to_string();
        assert!(message.contains(&sender.to_string()));
        assert!(message.contains("nonce 9"));
    }

    #[test]
    fn test_overflowing_gas_display() {
        let err = ChainError::InsufficientGas {
            action_hash: [1u8; 32],
            intrinsic_gas: None,
            gas_limit: 10,
        };
        assert!(err.to_string().contains("overflows"));
    }
}
