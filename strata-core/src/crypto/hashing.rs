//! SHA-256 hashing utilities.

use sha2::{Digest, Sha256};

/// 32-byte digest used for block and action hashes.
pub type Hash256 = [u8; 32];

/// Hash of the (virtual) parent of the genesis block.
pub const ZERO_HASH: Hash256 = [0u8; 32];

/// Compute SHA-256 hash of the input data.
#[inline]
pub fn sha256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash of concatenated data slices.
pub fn sha256_concat(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute the Merkle root of an ordered list of action hashes.
///
/// - Empty list returns [`ZERO_HASH`]
/// - Single hash returns that hash
/// - Otherwise, pair hashes and hash pairs recursively
/// - Odd leaves are duplicated
pub fn merkle_root(hashes: &[Hash256]) -> Hash256 {
    if hashes.is_empty() {
        return ZERO_HASH;
    }

    let mut level: Vec<Hash256> = hashes.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                sha256_concat(&[&pair[0], right])
            })
            .collect();
    }

    level[0]
}
