//! Bucket and key schema.
//!
//! Every value lives in a [`Namespace`] (bucket). The primary store holds
//! the tip pointers, the hash/height mappings and the height→shard
//! mapping; each shard store replicates the header, body, footer and
//! receipt buckets for the heights it owns.
//!
//! | Bucket | Key                    | Value                 |
//! |--------|------------------------|-----------------------|
//! | `blk`  | `th`                   | tip height            |
//! | `blk`  | `ts`                   | tip hash              |
//! | `blk`  | `hf.` + height         | shard index           |
//! | `h2h`  | `ha.` + hash           | height                |
//! | `h2h`  | `he.` + height         | hash                  |
//! | `bhr`  | hash                   | encoded header        |
//! | `bbd`  | hash                   | encoded body          |
//! | `bfr`  | hash                   | encoded footer        |
//! | `rpt`  | height                 | encoded receipt batch |
//! | `bix`  | block hash             | height                |
//! | `aix`  | action hash            | height                |
//!
//! Heights and shard indexes are 8-byte big-endian.

use strata_core::Hash256;

use crate::error::StorageError;

/// Storage buckets.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Tip pointers and height→shard mapping.
    Block = 0x01,
    /// Hash↔height mappings.
    HashHeight = 0x02,
    /// Block headers by hash.
    Header = 0x03,
    /// Block bodies by hash.
    Body = 0x04,
    /// Block footers by hash.
    Footer = 0x05,
    /// Receipt batches by height.
    Receipts = 0x06,
    /// Block index: block hash → height.
    BlockIndex = 0x07,
    /// Action index: action hash → height.
    ActionIndex = 0x08,
}

impl Namespace {
    /// Bucket name.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Block => "blk",
            Namespace::HashHeight => "h2h",
            Namespace::Header => "bhr",
            Namespace::Body => "bbd",
            Namespace::Footer => "bfr",
            Namespace::Receipts => "rpt",
            Namespace::BlockIndex => "bix",
            Namespace::ActionIndex => "aix",
        }
    }
}

/// Tip height key in [`Namespace::Block`].
pub const TIP_HEIGHT_KEY: &[u8] = b"th";

/// Tip hash key in [`Namespace::Block`].
pub const TIP_HASH_KEY: &[u8] = b"ts";

const HASH_PREFIX: &[u8] = b"ha.";
const HEIGHT_PREFIX: &[u8] = b"he.";
const HEIGHT_TO_SHARD_PREFIX: &[u8] = b"hf.";

/// Encode a height (or shard index) as a big-endian key or value.
#[inline]
pub fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// `ha.` + hash: hash → height mapping key.
pub fn hash_to_height_key(hash: &Hash256) -> Vec<u8> {
    prefixed(HASH_PREFIX, hash)
}

/// `he.` + height: height → hash mapping key.
pub fn height_to_hash_key(height: u64) -> Vec<u8> {
    prefixed(HEIGHT_PREFIX, &height_key(height))
}

/// `hf.` + height: height → shard index mapping key.
pub fn height_to_shard_key(height: u64) -> Vec<u8> {
    prefixed(HEIGHT_TO_SHARD_PREFIX, &height_key(height))
}

fn prefixed(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

/// Decode a stored big-endian u64.
pub fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, StorageError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {what} encoding: {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

/// Decode a stored 32-byte hash.
pub fn decode_hash(bytes: &[u8], what: &str) -> Result<Hash256, StorageError> {
    bytes
        .try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {what} length: {} bytes", bytes.len())))
}
