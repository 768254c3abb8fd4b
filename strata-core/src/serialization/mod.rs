//! Deterministic binary serialization for ledger data.
//!
//! Block headers, bodies, footers, sealed envelopes and receipt batches are
//! all persisted and hashed through one bincode configuration, so the same
//! value always produces the same bytes and therefore the same hash.

mod bincode_config;

pub use bincode_config::{deserialize, serialize, serialized_size};
