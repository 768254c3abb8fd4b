//! RocksDB key-value backend for production use.

use std::path::{Path, PathBuf};

use rocksdb::{Direction, IteratorMode, Options, DB};
use tracing::warn;

use super::{BatchOp, KvStore, WriteBatch};
use crate::error::StorageError;
use crate::keys::Namespace;

/// RocksDB-based key-value backend.
///
/// Buckets are emulated by prefixing every key with the namespace tag.
/// Writes are attempted up to `num_retries` times before an I/O error is
/// surfaced; each failed attempt is logged.
pub struct RocksBackend {
    db: DB,
    path: PathBuf,
    num_retries: u8,
}

impl RocksBackend {
    /// Open or create a RocksDB database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, num_retries: u8) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        // Shards are many and small; keep memtables modest
        opts.set_write_buffer_size(8 * 1024 * 1024);
        opts.set_max_write_buffer_number(2);
        opts.set_level_compaction_dynamic_level_bytes(true);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| StorageError::Io(format!("failed to open {}: {e}", path.as_ref().display())))?;
        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
            num_retries,
        })
    }

    /// Directory holding the database files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn full_key(ns: Namespace, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(key.len() + 1);
        full.push(ns as u8);
        full.extend_from_slice(key);
        full
    }

    fn with_retries<F>(&self, op: &str, mut write: F) -> Result<(), StorageError>
    where
        F: FnMut() -> Result<(), rocksdb::Error>,
    {
        let attempts = self.num_retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match write() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(op, attempt, attempts, error = %e, "rocksdb write failed");
                    last_error = Some(e);
                }
            }
        }
        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(StorageError::Io(format!("{op} failed after {attempts} attempts: {reason}")))
    }
}

impl KvStore for RocksBackend {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.db
            .get(Self::full_key(ns, key))?
            .ok_or_else(|| StorageError::NotExist(format!("key {} in bucket {}", hex::encode(key), ns.as_str())))
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let full = Self::full_key(ns, key);
        self.with_retries("put", || self.db.put(&full, value))
    }

    fn delete(&self, ns: Namespace, key: &[u8]) -> Result<(), StorageError> {
        let full = Self::full_key(ns, key);
        self.with_retries("delete", || self.db.delete(&full))
    }

    fn delete_bucket(&self, ns: Namespace) -> Result<(), StorageError> {
        let prefix = [ns as u8];
        let mut keys = Vec::new();
        for item in self.db.iterator(IteratorMode::From(&prefix, Direction::Forward)) {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            keys.push(key);
        }
        self.with_retries("delete_bucket", || {
            let mut batch = rocksdb::WriteBatch::default();
            for key in &keys {
                batch.delete(key);
            }
            self.db.write(batch)
        })
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        self.with_retries("commit", || {
            let mut rocks_batch = rocksdb::WriteBatch::default();
            for op in &batch.operations {
                match op {
                    BatchOp::Put { ns, key, value } => rocks_batch.put(Self::full_key(*ns, key), value),
                    BatchOp::Delete { ns, key } => rocks_batch.delete(Self::full_key(*ns, key)),
                }
            }
            self.db.write(rocks_batch)
        })
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn size_on_disk(&self) -> Result<u64, StorageError> {
        let mut size = 0;
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let is_data = entry
                .path()
                .extension()
                .map(|ext| ext == "sst" || ext == "log")
                .unwrap_or(false);
            if is_data {
                size += entry.metadata()?.len();
            }
        }
        Ok(size)
    }
}
