//! # Strata Core
//!
//! Core types, cryptography, and serialization for the Strata ledger.
//!
//! This crate provides the foundation for the storage and chain crates:
//! - Cryptographic primitives (Ed25519 signatures, SHA-256 hashing, Merkle roots)
//! - Account addresses derived from public keys
//! - Action envelopes, sealed (signed) envelopes and execution receipts
//! - Block structure: header, body and footer
//! - Deterministic binary serialization

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod block;
pub mod crypto;
pub mod error;
pub mod serialization;

// Re-export commonly used types at crate root
pub use action::{Action, Envelope, Log, Receipt, ReceiptStatus, SealedEnvelope};
pub use block::{Block, BlockBody, BlockFooter, BlockHeader, Endorsement};
pub use crypto::{Address, Hash256, KeyPair, PublicKey, Signature, ZERO_HASH};
pub use error::{CryptoError, SerializationError};
