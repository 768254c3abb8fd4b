//! Bucketed key-value stores.
//!
//! This module provides the [`KvStore`] abstraction with two implementations:
//! - `MemoryBackend`: in-memory buckets for testing
//! - `RocksBackend`: RocksDB-based persistent storage with bounded write retries

mod memory_backend;
mod rocks_backend;

pub use memory_backend::MemoryBackend;
pub use rocks_backend::RocksBackend;

use crate::error::StorageError;
use crate::keys::Namespace;

/// Trait for bucketed key-value stores.
///
/// Implementations must commit a [`WriteBatch`] atomically and must report
/// an absent key as [`StorageError::NotExist`], never as `Io`.
pub trait KvStore: Send + Sync {
    /// Get a value. Absent keys are `NotExist`.
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Vec<u8>, StorageError>;

    /// Put a key-value pair.
    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key succeeds.
    fn delete(&self, ns: Namespace, key: &[u8]) -> Result<(), StorageError>;

    /// Delete every key in a bucket.
    fn delete_bucket(&self, ns: Namespace) -> Result<(), StorageError>;

    /// Apply a batch of writes atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;

    /// Check if a key exists.
    fn exists(&self, ns: Namespace, key: &[u8]) -> Result<bool, StorageError> {
        match self.get(ns, key) {
            Ok(_) => Ok(true),
            Err(StorageError::NotExist(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Flush any buffered data to disk (if applicable).
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Bytes the store currently occupies; drives shard rollover.
    fn size_on_disk(&self) -> Result<u64, StorageError>;
}

/// A batch of write operations to be applied atomically.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    /// Operations in the batch.
    pub operations: Vec<BatchOp>,
}

/// A single operation in a write batch.
#[derive(Clone, Debug)]
pub enum BatchOp {
    /// Put a key-value pair.
    Put {
        /// Target bucket.
        ns: Namespace,
        /// The key to write.
        key: Vec<u8>,
        /// The value to write.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// Target bucket.
        ns: Namespace,
        /// The key to delete.
        key: Vec<u8>,
    },
}

impl WriteBatch {
    /// Create a new empty write batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a put operation to the batch.
    pub fn put(&mut self, ns: Namespace, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.operations.push(BatchOp::Put {
            ns,
            key: key.into(),
            value: value.into(),
        });
    }

    /// Add a delete operation to the batch.
    pub fn delete(&mut self, ns: Namespace, key: impl Into<Vec<u8>>) {
        self.operations.push(BatchOp::Delete { ns, key: key.into() });
    }

    /// Append all operations of another batch.
    pub fn append(&mut self, mut other: WriteBatch) {
        self.operations.append(&mut other.operations);
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get the number of operations in the batch.
    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
