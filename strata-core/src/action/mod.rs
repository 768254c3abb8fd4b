//! Actions, signed envelopes and execution receipts.
//!
//! An [`Action`] is the payload a sender wants executed. It travels inside
//! an [`Envelope`] carrying nonce and gas terms; signing the envelope yields
//! a [`SealedEnvelope`], the unit a block body is made of. Executing a
//! sealed envelope produces a [`Receipt`].

mod envelope;
mod receipt;
mod sealed;

pub use envelope::{Action, Envelope, RewardKind, BASE_INTRINSIC_GAS, PAYLOAD_GAS_PER_BYTE};
pub use receipt::{Log, Receipt, ReceiptStatus};
pub use sealed::SealedEnvelope;
