//! Cryptographic primitives for the ledger.
//!
//! This module provides:
//! - Ed25519 key pairs for block producers and action senders
//! - Signing and verification of block headers and envelopes
//! - SHA-256 hashing and the transaction Merkle root
//! - Account address derivation (first 20 bytes of SHA-256 of public key)

mod address;
mod hashing;
mod keys;
mod signing;

pub use address::Address;
pub use hashing::{merkle_root, sha256, sha256_concat, Hash256, ZERO_HASH};
pub use keys::{KeyPair, PublicKey};
pub use signing::Signature;
