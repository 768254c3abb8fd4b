//! zstd compression of stored block artifacts.

use crate::error::StorageError;

const LEVEL: i32 = 3;

/// Compress one encoded artifact.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    zstd::encode_all(data, LEVEL).map_err(|e| StorageError::Compression(e.to_string()))
}

/// Reverse [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    zstd::decode_all(data).map_err(|e| StorageError::Compression(e.to_string()))
}
