//! Shard files and the registry of open shard handles.
//!
//! Shard 0 is the primary store at `db_path`. Shard `n > 0` lives next to it
//! as `<stem>-%08d.db`, so `data/chain.db` grows `data/chain-00000001.db`,
//! `data/chain-00000002.db` and so on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::kv::{KvStore, MemoryBackend, RocksBackend};

/// Creates or reopens the store backing a shard index.
pub trait ShardFactory: Send + Sync {
    /// Store type behind every shard.
    type Store: KvStore + 'static;

    /// Open (creating if needed) the store for `index`. Index 0 is the primary store.
    fn open(&self, index: u64) -> Result<Arc<Self::Store>, StorageError>;

    /// Whether shard `index` has ever been created.
    fn exists(&self, index: u64) -> bool;

    /// Indexes (> 0) of the shards that already exist, ascending.
    fn discover(&self) -> Result<Vec<u64>, StorageError>;
}

/// RocksDB shards laid out next to the primary database.
#[derive(Clone, Debug)]
pub struct RocksShardFactory {
    db_path: PathBuf,
    num_retries: u8,
}

impl RocksShardFactory {
    /// Create a factory for the primary database at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>, num_retries: u8) -> Self {
        Self {
            db_path: db_path.into(),
            num_retries,
        }
    }

    /// Path of the database backing `index`.
    pub fn shard_path(&self, index: u64) -> PathBuf {
        if index == 0 {
            return self.db_path.clone();
        }
        self.dir().join(format!("{}-{:08}.db", self.stem(), index))
    }

    fn dir(&self) -> &Path {
        match self.db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn stem(&self) -> String {
        self.db_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn parse_index(&self, file_name: &str) -> Option<u64> {
        let prefix = format!("{}-", self.stem());
        let digits = file_name.strip_prefix(&prefix)?.strip_suffix(".db")?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|index| *index > 0)
    }
}

impl ShardFactory for RocksShardFactory {
    type Store = RocksBackend;

    fn open(&self, index: u64) -> Result<Arc<RocksBackend>, StorageError> {
        Ok(Arc::new(RocksBackend::open(self.shard_path(index), self.num_retries)?))
    }

    fn exists(&self, index: u64) -> bool {
        self.shard_path(index).exists()
    }

    fn discover(&self) -> Result<Vec<u64>, StorageError> {
        let dir = self.dir();
        let mut indexes = Vec::new();
        for entry in std::fs::read_dir(dir)
            .map_err(|e| StorageError::Io(format!("failed to read {}: {e}", dir.display())))?
        {
            let entry = entry?;
            if let Some(index) = self.parse_index(&entry.file_name().to_string_lossy()) {
                indexes.push(index);
            }
        }
        indexes.sort_unstable();
        Ok(indexes)
    }
}

/// In-memory shards. Clones share the same shards, so dropping a block store
/// and building a new one from a clone behaves like a restart.
#[derive(Clone, Default)]
pub struct MemoryShardFactory {
    shards: Arc<Mutex<HashMap<u64, Arc<MemoryBackend>>>>,
}

impl MemoryShardFactory {
    /// Create a factory with no shards.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of an already created shard.
    pub fn shard(&self, index: u64) -> Option<Arc<MemoryBackend>> {
        self.shards.lock().get(&index).cloned()
    }
}

impl ShardFactory for MemoryShardFactory {
    type Store = MemoryBackend;

    fn open(&self, index: u64) -> Result<Arc<MemoryBackend>, StorageError> {
        Ok(self.shards.lock().entry(index).or_default().clone())
    }

    fn exists(&self, index: u64) -> bool {
        self.shards.lock().contains_key(&index)
    }

    fn discover(&self) -> Result<Vec<u64>, StorageError> {
        let mut indexes: Vec<u64> = self.shards.lock().keys().copied().filter(|i| *i > 0).collect();
        indexes.sort_unstable();
        Ok(indexes)
    }
}

/// Open shard handles keyed by index, plus the current (top) shard index.
pub(crate) struct ShardRegistry<F: ShardFactory> {
    factory: F,
    shards: RwLock<HashMap<u64, Arc<F::Store>>>,
    open_lock: Mutex<()>,
    top_index: AtomicU64,
}

impl<F: ShardFactory> ShardRegistry<F> {
    pub(crate) fn new(factory: F) -> Self {
        Self {
            factory,
            shards: RwLock::new(HashMap::new()),
            open_lock: Mutex::new(()),
            top_index: AtomicU64::new(0),
        }
    }

    pub(crate) fn factory(&self) -> &F {
        &self.factory
    }

    /// Handle for `index`, opening the shard on first use.
    pub(crate) fn get_or_open(&self, index: u64) -> Result<Arc<F::Store>, StorageError> {
        if let Some(store) = self.get_opened(index) {
            return Ok(store);
        }

        let _guard = self.open_lock.lock();
        // Another writer may have opened it while we waited
        if let Some(store) = self.get_opened(index) {
            return Ok(store);
        }
        let store = self.factory.open(index)?;
        self.shards.write().insert(index, store.clone());
        debug!(index, "opened shard");
        Ok(store)
    }

    pub(crate) fn get_opened(&self, index: u64) -> Option<Arc<F::Store>> {
        self.shards.read().get(&index).cloned()
    }

    pub(crate) fn top(&self) -> u64 {
        self.top_index.load(Ordering::Acquire)
    }

    pub(crate) fn set_top(&self, index: u64) {
        self.top_index.store(index, Ordering::Release);
    }

    /// Flush and drop every handle.
    pub(crate) fn close_all(&self) {
        let _guard = self.open_lock.lock();
        let mut shards = self.shards.write();
        for (index, store) in shards.iter() {
            if let Err(e) = store.flush() {
                warn!(index, error = %e, "failed to flush shard on close");
            }
        }
        shards.clear();
    }
}
