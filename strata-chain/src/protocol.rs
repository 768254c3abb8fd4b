//! Per-action validators.
//!
//! Two kinds of validators inspect each action of a candidate block:
//! [`ActionEnvelopeValidator`]s see the whole sealed envelope, registered
//! [`Protocol`]s see only the action payload.

use std::sync::Arc;

use strata_core::{Action, SealedEnvelope};

use crate::context::ActionContext;
use crate::error::{ChainError, ChainResult};
use crate::state::StateReader;

/// Validates a sealed envelope (signature, gas, nonce, ...).
pub trait ActionEnvelopeValidator: Send + Sync {
    /// Reject the envelope with an error.
    fn validate(&self, ctx: &ActionContext, selp: &SealedEnvelope) -> ChainResult<()>;
}

/// A protocol's semantic check of action payloads.
pub trait Protocol: Send + Sync {
    /// Unique protocol id.
    fn id(&self) -> &str;

    /// Reject the action with an error.
    fn validate(&self, ctx: &ActionContext, action: &Action) -> ChainResult<()>;
}

/// Registered protocols in registration order.
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    protocols: Vec<Arc<dyn Protocol>>,
}

impl ProtocolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a protocol. Ids must be unique.
    pub fn register(&mut self, protocol: Arc<dyn Protocol>) -> ChainResult<()> {
        if self.find(protocol.id()).is_some() {
            return Err(ChainError::DuplicateProtocol {
                id: protocol.id().to_string(),
            });
        }
        self.protocols.push(protocol);
        Ok(())
    }

    /// Protocol registered under `id`.
    pub fn find(&self, id: &str) -> Option<&Arc<dyn Protocol>> {
        self.protocols.iter().find(|p| p.id() == id)
    }

    /// All protocols in registration order.
    pub fn all(&self) -> &[Arc<dyn Protocol>] {
        &self.protocols
    }

    /// Number of registered protocols.
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Check if no protocol is registered.
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

/// Checks every action must pass regardless of protocol:
/// 1. intrinsic gas fits the gas limit
/// 2. the envelope signature verifies
/// 3. a non-zero nonce is above the sender's confirmed nonce
pub struct GenericValidator {
    state: Arc<dyn StateReader>,
}

impl GenericValidator {
    /// Create a validator reading confirmed nonces from `state`.
    pub fn new(state: Arc<dyn StateReader>) -> Self {
        Self { state }
    }
}

impl ActionEnvelopeValidator for GenericValidator {
    fn validate(&self, ctx: &ActionContext, selp: &SealedEnvelope) -> ChainResult<()> {
        let action_hash = selp.hash();

        let intrinsic_gas = selp.intrinsic_gas();
        match intrinsic_gas {
            Some(gas) if gas <= selp.gas_limit() => {}
            _ => {
                return Err(ChainError::InsufficientGas {
                    action_hash,
                    intrinsic_gas,
                    gas_limit: selp.gas_limit(),
                })
            }
        }

        if selp.verify_signature().is_err() {
            return Err(ChainError::InvalidActionSignature { action_hash });
        }

        let pending = self.state.confirmed_nonce(&ctx.caller)?.saturating_add(1);
        let nonce = selp.nonce();
        if nonce > 0 && pending > nonce {
            return Err(ChainError::NonceTooLow {
                action_hash,
                nonce,
                pending,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NonceTable;
    use strata_core::{Address, Envelope, KeyPair};

    struct Named(&'static str);

    impl Protocol for Named {
        fn id(&self) -> &str {
            self.0
        }

        fn validate(&self, _ctx: &ActionContext, _action: &Action) -> ChainResult<()> {
            Ok(())
        }
    }

    fn execution(sender: &KeyPair, nonce: u64, gas_limit: u64, data: Vec<u8>) -> SealedEnvelope {
        let action = Action::Execution {
            contract: None,
            amount: 10,
            data,
        };
        Envelope::new(nonce, gas_limit, 10, action).seal(sender)
    }

    fn setup(confirmed: u64) -> (GenericValidator, KeyPair, ActionContext) {
        let sender = KeyPair::generate();
        let table = NonceTable::new();
        table.set(sender.address(), confirmed);
        let ctx = ActionContext {
            caller: sender.address(),
            block_height: 1,
        };
        (GenericValidator::new(Arc::new(table)), sender, ctx)
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let mut registry = ProtocolRegistry::new();
        registry.register(Arc::new(Named("account"))).unwrap();
        registry.register(Arc::new(Named("rewarding"))).unwrap();

        let err = registry.register(Arc::new(Named("account"))).unwrap_err();
        assert_eq!(err, ChainError::DuplicateProtocol { id: "account".into() });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.all()[1].id(), "rewarding");
        assert!(registry.find("rewarding").is_some());
        assert!(registry.find("poll").is_none());
    }

    #[test]
    fn test_generic_accepts_valid_envelope() {
        let (validator, sender, ctx) = setup(2);
        assert!(validator.validate(&ctx, &execution(&sender, 3, 100_000, Vec::new())).is_ok());
        // Gaps are the block-level check's business
        assert!(validator.validate(&ctx, &execution(&sender, 9, 100_000, Vec::new())).is_ok());
    }

    #[test]
    fn test_generic_rejects_low_gas_limit() {
        let (validator, sender, ctx) = setup(0);
        let selp = execution(&sender, 1, 10, vec![0u8; 4]);
        assert!(matches!(
            validator.validate(&ctx, &selp),
            Err(ChainError::InsufficientGas { gas_limit: 10, .. })
        ));
    }

    #[test]
    fn test_generic_rejects_tampered_envelope() {
        let (validator, sender, ctx) = setup(0);
        let mut selp = execution(&sender, 1, 100_000, Vec::new());
        selp.envelope.gas_price = 1_000;
        assert!(matches!(
            validator.validate(&ctx, &selp),
            Err(ChainError::InvalidActionSignature { .. })
        ));
    }

    #[test]
    fn test_generic_rejects_low_nonce() {
        let (validator, sender, ctx) = setup(2);
        let selp = execution(&sender, 2, 100_000, Vec::new());
        assert!(matches!(
            validator.validate(&ctx, &selp),
            Err(ChainError::NonceTooLow { nonce: 2, pending: 3, .. })
        ));
    }

    #[test]
    fn test_generic_skips_nonce_check_for_zero_nonce() {
        let (validator, sender, ctx) = setup(5);
        assert!(validator.validate(&ctx, &execution(&sender, 0, 100_000, Vec::new())).is_ok());
    }

    #[test]
    fn test_state_error_propagates() {
        struct Broken;
        impl StateReader for Broken {
            fn confirmed_nonce(&self, _address: &Address) -> ChainResult<u64> {
                Err(ChainError::State("unavailable".into()))
            }
        }

        let sender = KeyPair::generate();
        let validator = GenericValidator::new(Arc::new(Broken));
        let ctx = ActionContext {
            caller: sender.address(),
            block_height: 1,
        };
        assert!(matches!(
            validator.validate(&ctx, &execution(&sender, 1, 100_000, Vec::new())),
            Err(ChainError::State(_))
        ));
    }
}
