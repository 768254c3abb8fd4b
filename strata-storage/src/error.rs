//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
///
/// `NotExist` means "not written (yet)" and is recoverable; `Io` means the
/// backing store failed after its bounded retries.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key, block or receipt batch is absent.
    #[error("not exist: {0}")]
    NotExist(String),

    /// Backing store failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// A block at or below the tip was submitted.
    #[error("block {height} already exists (tip height {tip})")]
    AlreadyExists {
        /// Height of the rejected block.
        height: u64,
        /// Tip height at the time of the call.
        tip: u64,
    },

    /// A tip key is missing; the store was never started.
    #[error("block store uninitialized: {0} missing")]
    Uninitialized(&'static str),

    /// Operation issued before `start` or after `stop`.
    #[error("block store not started")]
    NotStarted,

    /// Encoding or decoding failed, or a stored value is malformed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Compressing or decompressing a block artifact failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// The genesis block is permanent.
    #[error("cannot delete genesis block")]
    CannotDeleteGenesis,

    /// The owning block has no receipt for this action.
    #[error("receipt of action {0} isn't found")]
    ReceiptNotFound(String),

    /// Receipts were written for a height whose shard is not open.
    #[error("shard {0} is not opened")]
    ShardNotOpened(u64),

    /// Block index update or lookup failed.
    #[error("index error: {0}")]
    Index(String),
}

impl StorageError {
    /// Whether this is the recoverable "absent" case.
    pub fn is_not_exist(&self) -> bool {
        matches!(self, StorageError::NotExist(_))
    }
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<strata_core::SerializationError> for StorageError {
    fn from(e: strata_core::SerializationError) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
