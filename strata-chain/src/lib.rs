//! Block validation and block production for the Strata ledger.
//!
//! This crate implements:
//! - Block admission: tip linkage, producer signature, tx root
//! - Per-action validation fanned out over envelope validators and protocols
//! - Per-sender nonce continuity against committed state
//! - Block production on top of the current tip
//!
//! # Example
//!
//! ```ignore
//! use strata_chain::{BlockBuilder, BlockchainContext, Validator};
//!
//! let tip = BlockchainContext::new(dao.get_tip_height()?, dao.get_tip_hash()?);
//! let block = BlockBuilder::new(&tip, now).build(&producer);
//! Validator::builder().build().validate(&tip, &block)?;
//! ```

mod context;
mod error;
mod production;
mod protocol;
mod state;
mod validator;

pub use context::{ActionContext, BlockchainContext};
pub use error::{ChainError, ChainResult};
pub use production::BlockBuilder;
pub use protocol::{ActionEnvelopeValidator, GenericValidator, Protocol, ProtocolRegistry};
pub use state::{ActPool, NonceTable, StateReader};
pub use validator::{Validator, ValidatorBuilder};
