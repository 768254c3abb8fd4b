//! Block and action indexing.
//!
//! The block store calls a [`BlockIndexer`] after every stored or deleted
//! block. [`KvIndexer`] keeps two buckets: `bix` (block hash → height) and
//! `aix` (action hash → height). Batched calls accumulate in a pending
//! batch until [`BlockIndexer::commit`].

use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{Block, Hash256};

use crate::error::StorageError;
use crate::keys::{decode_u64, height_key, Namespace};
use crate::kv::{KvStore, WriteBatch};

/// Index collaborator of the block store.
pub trait BlockIndexer: Send + Sync {
    /// Index the block hash. With `batched`, the write waits for [`commit`](Self::commit).
    fn index_block(&self, block: &Block, batched: bool) -> Result<(), StorageError>;

    /// Index every action of the block into the pending batch.
    fn index_action(&self, block: &Block) -> Result<(), StorageError>;

    /// Commit pending writes.
    fn commit(&self) -> Result<(), StorageError>;

    /// Height of the block containing the action.
    fn get_block_height_by_action_hash(&self, hash: &Hash256) -> Result<u64, StorageError>;

    /// Remove the block hash entry.
    fn delete_block_index(&self, block: &Block) -> Result<(), StorageError>;

    /// Remove the entries of every action of the block.
    fn delete_action_index(&self, block: &Block) -> Result<(), StorageError>;
}

/// [`BlockIndexer`] over a key-value store.
pub struct KvIndexer<S: KvStore> {
    store: Arc<S>,
    pending: Mutex<WriteBatch>,
}

impl<S: KvStore> KvIndexer<S> {
    /// Create an indexer writing to `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            pending: Mutex::new(WriteBatch::new()),
        }
    }

    /// Height of an indexed block.
    pub fn block_height(&self, hash: &Hash256) -> Result<u64, StorageError> {
        let value = self.store.get(Namespace::BlockIndex, hash)?;
        decode_u64(&value, "indexed height")
    }
}

impl<S: KvStore> BlockIndexer for KvIndexer<S> {
    fn index_block(&self, block: &Block, batched: bool) -> Result<(), StorageError> {
        let hash = block.hash();
        let height = height_key(block.height());
        if batched {
            self.pending.lock().put(Namespace::BlockIndex, hash.to_vec(), height.to_vec());
            return Ok(());
        }
        self.store.put(Namespace::BlockIndex, &hash, &height)
    }

    fn index_action(&self, block: &Block) -> Result<(), StorageError> {
        let height = height_key(block.height());
        let mut pending = self.pending.lock();
        for selp in block.actions() {
            pending.put(Namespace::ActionIndex, selp.hash().to_vec(), height.to_vec());
        }
        Ok(())
    }

    fn commit(&self) -> Result<(), StorageError> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return Ok(());
        }
        self.store.commit(batch)
    }

    fn get_block_height_by_action_hash(&self, hash: &Hash256) -> Result<u64, StorageError> {
        let value = self.store.get(Namespace::ActionIndex, hash)?;
        decode_u64(&value, "indexed height")
    }

    fn delete_block_index(&self, block: &Block) -> Result<(), StorageError> {
        self.store.delete(Namespace::BlockIndex, &block.hash())
    }

    fn delete_action_index(&self, block: &Block) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        for selp in block.actions() {
            batch.delete(Namespace::ActionIndex, selp.hash().to_vec());
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.store.commit(batch)
    }
}
