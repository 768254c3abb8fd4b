//! In-memory key-value backend for testing.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use super::{BatchOp, KvStore, WriteBatch};
use crate::error::StorageError;
use crate::keys::Namespace;

type Bucket = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory key-value backend with one BTreeMap per bucket.
///
/// Writes can be switched off with [`MemoryBackend::set_read_only`] to
/// simulate a failing disk.
#[derive(Default)]
pub struct MemoryBackend {
    buckets: RwLock<HashMap<Namespace, Bucket>>,
    read_only: RwLock<bool>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.read().values().map(BTreeMap::len).sum()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.write() = read_only;
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if *self.read_only.read() {
            return Err(StorageError::Io("memory backend is read-only".into()));
        }
        Ok(())
    }
}

impl KvStore for MemoryBackend {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.buckets
            .read()
            .get(&ns)
            .and_then(|bucket| bucket.get(key))
            .cloned()
            .ok_or_else(|| StorageError::NotExist(format!("key {} in bucket {}", hex::encode(key), ns.as_str())))
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.check_writable()?;
        self.buckets
            .write()
            .entry(ns)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, ns: Namespace, key: &[u8]) -> Result<(), StorageError> {
        self.check_writable()?;
        if let Some(bucket) = self.buckets.write().get_mut(&ns) {
            bucket.remove(key);
        }
        Ok(())
    }

    fn delete_bucket(&self, ns: Namespace) -> Result<(), StorageError> {
        self.check_writable()?;
        self.buckets.write().remove(&ns);
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut buckets = self.buckets.write();
        for op in batch.operations {
            match op {
                BatchOp::Put { ns, key, value } => {
                    buckets.entry(ns).or_default().insert(key, value);
                }
                BatchOp::Delete { ns, key } => {
                    if let Some(bucket) = buckets.get_mut(&ns) {
                        bucket.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn size_on_disk(&self) -> Result<u64, StorageError> {
        let size = self
            .buckets
            .read()
            .values()
            .flat_map(|bucket| bucket.iter())
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum();
        Ok(size)
    }
}
