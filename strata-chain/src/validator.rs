//! Block validation.
//!
//! A candidate block passes through four checks, in order:
//! 1. height == tip height + 1 and prev_hash == tip hash (skipped for genesis)
//! 2. producer signature (skipped for genesis) and tx_root
//! 3. per-action validation: repeated actions, deny list, then every
//!    envelope validator and every registered protocol against every action,
//!    fanned out on rayon
//! 4. each sender's nonces continue its confirmed nonce (skipped for genesis)
//!
//! Steps 3 and 4 run only when a state reader is configured.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{Address, Block, Hash256, SealedEnvelope};
use tracing::{debug, warn};

use crate::context::{ActionContext, BlockchainContext};
use crate::error::{ChainError, ChainResult};
use crate::protocol::{ActionEnvelopeValidator, ProtocolRegistry};
use crate::state::{ActPool, StateReader};

/// Admission check for candidate blocks.
pub struct Validator {
    state: Option<Arc<dyn StateReader>>,
    envelope_validators: Vec<Arc<dyn ActionEnvelopeValidator>>,
    registry: ProtocolRegistry,
    act_pool: Option<Arc<dyn ActPool>>,
    deny_list: HashSet<Address>,
}

/// Builder for [`Validator`].
#[derive(Default)]
pub struct ValidatorBuilder {
    state: Option<Arc<dyn StateReader>>,
    envelope_validators: Vec<Arc<dyn ActionEnvelopeValidator>>,
    registry: ProtocolRegistry,
    act_pool: Option<Arc<dyn ActPool>>,
    deny_list: HashSet<Address>,
}

impl ValidatorBuilder {
    /// Create a builder with no collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable per-action and nonce validation against `state`.
    pub fn state_reader(mut self, state: Arc<dyn StateReader>) -> Self {
        self.state = Some(state);
        self
    }

    /// Append envelope validators.
    pub fn add_envelope_validators(
        mut self,
        validators: impl IntoIterator<Item = Arc<dyn ActionEnvelopeValidator>>,
    ) -> Self {
        self.envelope_validators.extend(validators);
        self
    }

    /// Protocols whose validators run against every action.
    pub fn registry(mut self, registry: ProtocolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Skip re-validating actions this pool already holds.
    pub fn set_act_pool(mut self, act_pool: Arc<dyn ActPool>) -> Self {
        self.act_pool = Some(act_pool);
        self
    }

    /// Reject every block containing an action from one of `senders`.
    pub fn deny_senders(mut self, senders: impl IntoIterator<Item = Address>) -> Self {
        self.deny_list.extend(senders);
        self
    }

    /// Build the validator.
    pub fn build(self) -> Validator {
        Validator {
            state: self.state,
            envelope_validators: self.envelope_validators,
            registry: self.registry,
            act_pool: self.act_pool,
            deny_list: self.deny_list,
        }
    }
}

impl Validator {
    /// Start building a validator.
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// Validate a candidate block against the tip in `ctx`.
    pub fn validate(&self, ctx: &BlockchainContext, block: &Block) -> ChainResult<()> {
        let result = self.validate_block(ctx, block);
        match &result {
            Ok(()) => debug!(height = block.height(), actions = block.actions().len(), "block validated"),
            Err(e) => warn!(height = block.height(), error = %e, "block rejected"),
        }
        result
    }

    fn validate_block(&self, ctx: &BlockchainContext, block: &Block) -> ChainResult<()> {
        verify_height_and_hash(ctx, block)?;
        verify_signature_and_root(block)?;

        let state = match &self.state {
            Some(state) => state,
            None => return Ok(()),
        };
        let nonces = self.validate_actions(block)?;

        if block.height() == 0 {
            return Ok(());
        }
        verify_nonces(state.as_ref(), nonces)
    }

    /// Run the deny list and every per-action validator, returning the
    /// non-zero nonces of each sender in block order.
    fn validate_actions(&self, block: &Block) -> ChainResult<BTreeMap<Address, Vec<u64>>> {
        let mut nonces: BTreeMap<Address, Vec<u64>> = BTreeMap::new();
        let mut pending: Vec<(ActionContext, &SealedEnvelope)> = Vec::with_capacity(block.actions().len());
        let mut seen: HashSet<Hash256> = HashSet::with_capacity(block.actions().len());

        for selp in block.actions() {
            let action_hash = selp.hash();
            // A repeated last leaf leaves the tx root unchanged
            if !seen.insert(action_hash) {
                return Err(ChainError::ActionValidation {
                    action_hash,
                    error: "duplicate action in block".to_string(),
                });
            }
            let caller = selp.sender();
            if self.deny_list.contains(&caller) {
                return Err(ChainError::BlacklistedSender { address: caller });
            }
            if selp.nonce() != 0 {
                nonces.entry(caller).or_default().push(selp.nonce());
            }
            if let Some(pool) = &self.act_pool {
                if pool.get_action_by_hash(&action_hash).is_some() {
                    continue;
                }
            }
            let ctx = ActionContext {
                caller,
                block_height: block.height(),
            };
            pending.push((ctx, selp));
        }

        let first_error: Mutex<Option<ChainError>> = Mutex::new(None);
        let first_error_ref = &first_error;
        rayon::scope(|scope| {
            for (ctx, selp) in &pending {
                for validator in &self.envelope_validators {
                    scope.spawn(move |_| {
                        if let Err(e) = validator.validate(ctx, selp) {
                            record_error(first_error_ref, e);
                        }
                    });
                }
                for protocol in self.registry.all() {
                    scope.spawn(move |_| {
                        if let Err(e) = protocol.validate(ctx, selp.action()) {
                            record_error(
                                first_error_ref,
                                ChainError::ActionValidation {
                                    action_hash: selp.hash(),
                                    error: format!("{}: {e}", protocol.id()),
                                },
                            );
                        }
                    });
                }
            }
        });

        match first_error.into_inner() {
            Some(e) => Err(e),
            None => Ok(nonces),
        }
    }
}

fn record_error(slot: &Mutex<Option<ChainError>>, error: ChainError) {
    let mut slot = slot.lock();
    if slot.is_none() {
        *slot = Some(error);
    }
}

fn verify_height_and_hash(ctx: &BlockchainContext, block: &Block) -> ChainResult<()> {
    let height = block.height();
    if height == 0 {
        return Ok(());
    }
    let expected = ctx.tip_height.saturating_add(1);
    if height != expected {
        return Err(ChainError::InvalidTipHeight {
            expected,
            actual: height,
        });
    }
    if block.prev_hash() != ctx.tip_hash {
        return Err(ChainError::InvalidPrevHash {
            expected: ctx.tip_hash,
            actual: block.prev_hash(),
        });
    }
    Ok(())
}

fn verify_signature_and_root(block: &Block) -> ChainResult<()> {
    if block.height() > 0 && block.verify_signature().is_err() {
        return Err(ChainError::InvalidSignature {
            producer: *block.header.producer.as_bytes(),
        });
    }

    let computed_tx_root = block.compute_tx_root();
    if block.header.tx_root != computed_tx_root {
        return Err(ChainError::InvalidTxRoot {
            expected: block.header.tx_root,
            actual: computed_tx_root,
        });
    }
    Ok(())
}

fn verify_nonces(state: &dyn StateReader, nonces: BTreeMap<Address, Vec<u64>>) -> ChainResult<()> {
    for (sender, mut received) in nonces {
        let confirmed = state.confirmed_nonce(&sender)?;
        received.sort_unstable();
        for (index, nonce) in received.into_iter().enumerate() {
            let expected = confirmed.checked_add(index as u64 + 1);
            if expected != Some(nonce) {
                return Err(ChainError::InvalidNonce {
                    sender,
                    index,
                    nonce,
                    expected: expected.unwrap_or(u64::MAX),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use strata_core::action::RewardKind;
    use strata_core::{Action, Envelope, Hash256, KeyPair, Signature};

    use crate::production::BlockBuilder;
    use crate::protocol::{GenericValidator, Protocol};
    use crate::state::NonceTable;

    const TIP_HASH: Hash256 = [0x77; 32];

    fn tip() -> BlockchainContext {
        BlockchainContext::new(9, TIP_HASH)
    }

    fn transfer(sender: &KeyPair, nonce: u64, amount: u128) -> SealedEnvelope {
        let action = Action::Transfer {
            recipient: Address([4u8; 20]),
            amount,
            payload: Vec::new(),
        };
        Envelope::new(nonce, 20_000, 1, action).seal(sender)
    }

    fn block_at(ctx: &BlockchainContext, actions: Vec<SealedEnvelope>) -> Block {
        let mut builder = BlockBuilder::new(ctx, 1_700_000_100);
        for selp in actions {
            builder.add_action(selp).unwrap();
        }
        builder.build(&KeyPair::from_seed(&[1u8; 32]))
    }

    /// Validator with the generic envelope checks over `table`.
    fn generic(table: Arc<NonceTable>) -> ValidatorBuilder {
        Validator::builder()
            .state_reader(table.clone())
            .add_envelope_validators([Arc::new(GenericValidator::new(table)) as Arc<dyn ActionEnvelopeValidator>])
    }

    struct Reject;

    impl Protocol for Reject {
        fn id(&self) -> &str {
            "reject"
        }

        fn validate(&self, _ctx: &ActionContext, _action: &Action) -> ChainResult<()> {
            Err(ChainError::State("not accepted".into()))
        }
    }

    fn rejecting_registry() -> ProtocolRegistry {
        let mut registry = ProtocolRegistry::new();
        registry.register(Arc::new(Reject)).unwrap();
        registry
    }

    #[derive(Default)]
    struct Pool(HashMap<Hash256, SealedEnvelope>);

    impl ActPool for Pool {
        fn get_action_by_hash(&self, hash: &Hash256) -> Option<SealedEnvelope> {
            self.0.get(hash).cloned()
        }
    }

    #[test]
    fn test_consecutive_nonces_validate() {
        let sender = KeyPair::generate();
        let table = Arc::new(NonceTable::new());
        table.set(sender.address(), 4);
        let validator = generic(table).build();

        let block = block_at(&tip(), vec![transfer(&sender, 6, 1), transfer(&sender, 5, 1)]);
        assert!(validator.validate(&tip(), &block).is_ok());
    }

    #[test]
    fn test_duplicate_nonce_is_rejected() {
        let sender = KeyPair::generate();
        let table = Arc::new(NonceTable::new());
        table.set(sender.address(), 4);
        let validator = generic(table).build();

        let block = block_at(&tip(), vec![transfer(&sender, 5, 1), transfer(&sender, 5, 2)]);
        assert_eq!(
            validator.validate(&tip(), &block),
            Err(ChainError::InvalidNonce {
                sender: sender.address(),
                index: 1,
                nonce: 5,
                expected: 6,
            })
        );
    }

    #[test]
    fn test_nonce_gap_is_rejected() {
        let sender = KeyPair::generate();
        let table = Arc::new(NonceTable::new());
        table.set(sender.address(), 4);
        let validator = generic(table).build();

        let block = block_at(&tip(), vec![transfer(&sender, 6, 1)]);
        assert!(matches!(
            validator.validate(&tip(), &block),
            Err(ChainError::InvalidNonce {
                index: 0,
                nonce: 6,
                expected: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_confirmed_nonce_at_max_is_rejected() {
        let sender = KeyPair::generate();
        let table = Arc::new(NonceTable::new());
        table.set(sender.address(), u64::MAX);
        let validator = Validator::builder().state_reader(table).build();

        let block = block_at(&tip(), vec![transfer(&sender, 5, 1)]);
        assert_eq!(
            validator.validate(&tip(), &block),
            Err(ChainError::InvalidNonce {
                sender: sender.address(),
                index: 0,
                nonce: 5,
                expected: u64::MAX,
            })
        );
    }

    #[test]
    fn test_repeated_last_action_is_rejected() {
        let producer = KeyPair::generate();
        let grants: Vec<SealedEnvelope> = (0..3u64)
            .map(|i| {
                let action = Action::GrantReward {
                    kind: RewardKind::Block,
                    height: i,
                };
                Envelope::new(0, 0, 0, action).seal(&producer)
            })
            .collect();
        let mut block = block_at(&tip(), grants);
        let last = block.body.actions[2].clone();
        block.body.actions.push(last.clone());

        // Same tx root, same block hash
        assert!(block.verify_tx_root());
        let validator = Validator::builder()
            .state_reader(Arc::new(NonceTable::new()))
            .build();
        assert_eq!(
            validator.validate(&tip(), &block),
            Err(ChainError::ActionValidation {
                action_hash: last.hash(),
                error: "duplicate action in block".to_string(),
            })
        );
    }

    #[test]
    fn test_zero_nonces_are_ignored() {
        let sender = KeyPair::generate();
        let validator = generic(Arc::new(NonceTable::new())).build();

        let block = block_at(&tip(), vec![transfer(&sender, 0, 1), transfer(&sender, 1, 1), transfer(&sender, 0, 2)]);
        assert!(validator.validate(&tip(), &block).is_ok());
    }

    #[test]
    fn test_denied_sender_rejects_block() {
        let honest = KeyPair::generate();
        let denied = KeyPair::generate();
        let validator = generic(Arc::new(NonceTable::new()))
            .deny_senders([denied.address()])
            .build();

        let block = block_at(&tip(), vec![transfer(&honest, 1, 1), transfer(&denied, 1, 1)]);
        assert_eq!(
            validator.validate(&tip(), &block),
            Err(ChainError::BlacklistedSender {
                address: denied.address()
            })
        );
    }

    #[test]
    fn test_pooled_actions_skip_validation() {
        let sender = KeyPair::generate();
        let selp = transfer(&sender, 1, 1);
        let block = block_at(&tip(), vec![selp.clone()]);

        let strict = Validator::builder()
            .state_reader(Arc::new(NonceTable::new()))
            .registry(rejecting_registry())
            .build();
        assert!(matches!(
            strict.validate(&tip(), &block),
            Err(ChainError::ActionValidation { .. })
        ));

        let mut pool = Pool::default();
        pool.0.insert(selp.hash(), selp);
        let trusting = Validator::builder()
            .state_reader(Arc::new(NonceTable::new()))
            .registry(rejecting_registry())
            .set_act_pool(Arc::new(pool))
            .build();
        assert!(trusting.validate(&tip(), &block).is_ok());
    }

    #[test]
    fn test_pooled_actions_still_count_for_nonces() {
        let sender = KeyPair::generate();
        let first = transfer(&sender, 1, 1);
        let duplicate = transfer(&sender, 1, 2);
        let block = block_at(&tip(), vec![first.clone(), duplicate]);

        let mut pool = Pool::default();
        pool.0.insert(first.hash(), first);
        let validator = generic(Arc::new(NonceTable::new()))
            .set_act_pool(Arc::new(pool))
            .build();
        assert!(matches!(
            validator.validate(&tip(), &block),
            Err(ChainError::InvalidNonce { index: 1, .. })
        ));
    }

    #[test]
    fn test_fan_out_joins_all_tasks_and_keeps_one_error() {
        struct Counting(AtomicUsize);

        impl ActionEnvelopeValidator for Counting {
            fn validate(&self, _ctx: &ActionContext, _selp: &SealedEnvelope) -> ChainResult<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let validator = Validator::builder()
            .state_reader(Arc::new(NonceTable::new()))
            .add_envelope_validators([
                counter.clone() as Arc<dyn ActionEnvelopeValidator>,
                counter.clone() as Arc<dyn ActionEnvelopeValidator>,
            ])
            .registry(rejecting_registry())
            .build();

        let senders: Vec<KeyPair> = (0..16).map(|_| KeyPair::generate()).collect();
        let actions: Vec<SealedEnvelope> = senders.iter().map(|kp| transfer(kp, 1, 1)).collect();
        let hashes: HashSet<Hash256> = actions.iter().map(SealedEnvelope::hash).collect();
        let block = block_at(&tip(), actions);

        match validator.validate(&tip(), &block) {
            Err(ChainError::ActionValidation { action_hash, error }) => {
                assert!(hashes.contains(&action_hash));
                assert!(error.starts_with("reject:"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_tip_mismatch() {
        let validator = Validator::builder().build();

        let skipped = block_at(&BlockchainContext::new(10, TIP_HASH), Vec::new());
        assert_eq!(
            validator.validate(&tip(), &skipped),
            Err(ChainError::InvalidTipHeight {
                expected: 10,
                actual: 11
            })
        );

        let forked = block_at(&BlockchainContext::new(9, [0x55; 32]), Vec::new());
        assert_eq!(
            validator.validate(&tip(), &forked),
            Err(ChainError::InvalidPrevHash {
                expected: TIP_HASH,
                actual: [0x55; 32]
            })
        );
    }

    #[test]
    fn test_bad_signature() {
        let validator = Validator::builder().build();
        let mut block = block_at(&tip(), Vec::new());
        block.header.timestamp += 1;

        assert!(matches!(
            validator.validate(&tip(), &block),
            Err(ChainError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_bad_tx_root() {
        let validator = Validator::builder().build();
        let sender = KeyPair::generate();
        let mut block = block_at(&tip(), vec![transfer(&sender, 1, 1)]);
        block.body.actions.push(transfer(&sender, 2, 1));

        assert!(matches!(
            validator.validate(&tip(), &block),
            Err(ChainError::InvalidTxRoot { .. })
        ));
    }

    #[test]
    fn test_genesis_skips_signature_and_nonces() {
        let sender = KeyPair::generate();
        let mut builder = BlockBuilder::genesis(1_700_000_000);
        builder.add_action(transfer(&sender, 7, 1)).unwrap();
        let mut genesis = builder.build(&KeyPair::generate());
        genesis.header.signature = Signature::empty();

        let validator = generic(Arc::new(NonceTable::new())).build();
        // Genesis ignores the tip entirely
        assert!(validator
            .validate(&BlockchainContext::new(42, [0xEE; 32]), &genesis)
            .is_ok());
    }

    #[test]
    fn test_genesis_tx_root_still_checked() {
        let mut genesis = BlockBuilder::genesis(1_700_000_000).build(&KeyPair::generate());
        genesis.header.tx_root = [1u8; 32];

        assert!(matches!(
            Validator::builder().build().validate(&BlockchainContext::empty(), &genesis),
            Err(ChainError::InvalidTxRoot { .. })
        ));
    }

    #[test]
    fn test_without_state_reader_actions_are_not_checked() {
        let sender = KeyPair::generate();
        let validator = Validator::builder()
            .registry(rejecting_registry())
            .deny_senders([sender.address()])
            .build();

        let block = block_at(&tip(), vec![transfer(&sender, 99, 1)]);
        assert!(validator.validate(&tip(), &block).is_ok());
    }

    #[test]
    fn test_state_reader_error_rejects_block() {
        struct Unavailable;

        impl StateReader for Unavailable {
            fn confirmed_nonce(&self, _address: &Address) -> ChainResult<u64> {
                Err(ChainError::State("state unavailable".into()))
            }
        }

        let validator = Validator::builder().state_reader(Arc::new(Unavailable)).build();
        let block = block_at(&tip(), vec![transfer(&KeyPair::generate(), 1, 1)]);
        assert_eq!(
            validator.validate(&tip(), &block),
            Err(ChainError::State("state unavailable".into()))
        );

        // No senders, no lookups
        let empty = block_at(&tip(), Vec::new());
        assert!(validator.validate(&tip(), &empty).is_ok());
    }
}
