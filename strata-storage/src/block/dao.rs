//! The block store.
//!
//! [`BlockDao`] persists blocks as three separately encoded artifacts
//! (header, body, footer) plus one receipt batch per height, and hides
//! sharding, compression and caching from its callers.
//!
//! Write path for a block at height `h`:
//! 1. reject `h <= tip`
//! 2. encode (and optionally compress) header, body and footer
//! 3. commit them to the shard owning `h`
//! 4. commit hash↔height, height→shard and the new tip to the primary store
//! 5. hand the block to the indexer according to [`IndexMode`]
//!
//! Steps 3 and 4 are one commit when the owning shard is the primary store.
//! If step 3 fails, nothing of step 4 is written.

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_core::serialization::{deserialize, serialize};
use strata_core::{Block, BlockBody, BlockFooter, BlockHeader, Hash256, Receipt, ZERO_HASH};
use tracing::{debug, error, info, warn};

use super::cache::{ArtifactCache, BlockCaches};
use super::index::BlockIndexer;
use super::shard::{RocksShardFactory, ShardFactory, ShardRegistry};
use crate::compress::{compress, decompress};
use crate::config::{DbConfig, IndexMode};
use crate::error::StorageError;
use crate::keys::{
    decode_hash, decode_u64, hash_to_height_key, height_key, height_to_hash_key, height_to_shard_key,
    Namespace, TIP_HASH_KEY, TIP_HEIGHT_KEY,
};
use crate::kv::{KvStore, WriteBatch};
use crate::metrics::{ArtifactKind, NoopMetrics, StoreMetrics};

/// Block and receipt storage over one primary store and optional shards.
pub struct BlockDao<F: ShardFactory> {
    config: DbConfig,
    shards: ShardRegistry<F>,
    indexer: Option<Arc<dyn BlockIndexer>>,
    caches: BlockCaches,
    metrics: Arc<dyn StoreMetrics>,
}

impl BlockDao<RocksShardFactory> {
    /// Block store over RocksDB files at `config.db_path`.
    pub fn open_rocks(config: DbConfig) -> Self {
        let factory = RocksShardFactory::new(config.db_path.clone(), config.num_retries);
        Self::new(factory, config)
    }
}

impl<F: ShardFactory> BlockDao<F> {
    /// Create a block store. Nothing is opened until [`start`](Self::start).
    pub fn new(factory: F, config: DbConfig) -> Self {
        Self {
            caches: BlockCaches::new(config.max_cache_size),
            config,
            shards: ShardRegistry::new(factory),
            indexer: None,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Attach the index collaborator.
    pub fn with_indexer(mut self, indexer: Arc<dyn BlockIndexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Report cache and timing observations to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn StoreMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Open the primary store, initialize the tip on first use and reopen
    /// every shard left by a previous run.
    pub fn start(&self) -> Result<(), StorageError> {
        let primary = self.shards.get_or_open(0)?;
        if !primary.exists(Namespace::Block, TIP_HEIGHT_KEY)? {
            let mut batch = WriteBatch::new();
            batch.put(Namespace::Block, TIP_HEIGHT_KEY, height_key(0).to_vec());
            batch.put(Namespace::Block, TIP_HASH_KEY, ZERO_HASH.to_vec());
            primary.commit(batch)?;
            debug!("initialized empty block store");
        }

        let discovered = self.shards.factory().discover()?;
        for index in &discovered {
            self.shards.get_or_open(*index)?;
        }
        let top = discovered.last().copied().unwrap_or(1);
        self.shards.set_top(top);

        info!(
            path = %self.config.db_path.display(),
            shards = discovered.len(),
            top_shard = top,
            "block store started"
        );
        Ok(())
    }

    /// Flush and release every open store.
    pub fn stop(&self) -> Result<(), StorageError> {
        self.shards.close_all();
        info!(path = %self.config.db_path.display(), "block store stopped");
        Ok(())
    }

    /// Handle of the primary store.
    pub fn kv_store(&self) -> Result<Arc<F::Store>, StorageError> {
        self.primary()
    }

    /// Append a block above the current tip.
    pub fn put_block(&self, block: &Block) -> Result<(), StorageError> {
        let started = Instant::now();
        let height = block.height();
        let tip = self.get_tip_height()?;
        if height <= tip {
            return Err(StorageError::AlreadyExists { height, tip });
        }

        let hash = block.hash();
        let header = self.encode(&block.header, "compress_header")?;
        let body = self.encode(&block.body, "compress_body")?;
        let footer = self.encode(&block.footer, "compress_footer")?;

        let (store, index) = self.top_shard(height)?;
        let mut block_batch = WriteBatch::new();
        block_batch.put(Namespace::Header, hash.to_vec(), header);
        block_batch.put(Namespace::Body, hash.to_vec(), body);
        block_batch.put(Namespace::Footer, hash.to_vec(), footer);

        let mut primary_batch = WriteBatch::new();
        primary_batch.put(Namespace::HashHeight, hash_to_height_key(&hash), height_key(height).to_vec());
        primary_batch.put(Namespace::HashHeight, height_to_hash_key(height), hash.to_vec());
        primary_batch.put(Namespace::Block, TIP_HEIGHT_KEY, height_key(height).to_vec());
        primary_batch.put(Namespace::Block, TIP_HASH_KEY, hash.to_vec());
        if index > 0 {
            primary_batch.put(Namespace::Block, height_to_shard_key(height), height_key(index).to_vec());
        }

        if index == 0 {
            block_batch.append(primary_batch);
            store.commit(block_batch)?;
        } else {
            store.commit(block_batch)?;
            self.primary()?.commit(primary_batch)?;
        }

        self.index_block(block)?;
        self.metrics.observe("put_block", started.elapsed());
        debug!(height, hash = %hex::encode(hash), shard = index, "stored block");
        Ok(())
    }

    /// Full block by hash.
    pub fn get_block(&self, hash: &Hash256) -> Result<Block, StorageError> {
        Ok(Block::new(self.header(hash)?, self.body(hash)?, self.footer(hash)?))
    }

    /// Full block by height.
    pub fn get_block_by_height(&self, height: u64) -> Result<Block, StorageError> {
        let hash = self.get_block_hash(height)?;
        self.get_block(&hash)
    }

    /// Block header by hash.
    pub fn header(&self, hash: &Hash256) -> Result<BlockHeader, StorageError> {
        self.cached_artifact(
            &self.caches.header,
            ArtifactKind::Header,
            Namespace::Header,
            hash,
            "decompress_header",
        )
    }

    /// Block body by hash.
    pub fn body(&self, hash: &Hash256) -> Result<BlockBody, StorageError> {
        self.cached_artifact(&self.caches.body, ArtifactKind::Body, Namespace::Body, hash, "decompress_body")
    }

    /// Block footer by hash.
    pub fn footer(&self, hash: &Hash256) -> Result<BlockFooter, StorageError> {
        self.cached_artifact(
            &self.caches.footer,
            ArtifactKind::Footer,
            Namespace::Footer,
            hash,
            "decompress_footer",
        )
    }

    /// Hash of the block at `height`. Height 0 is always [`ZERO_HASH`].
    pub fn get_block_hash(&self, height: u64) -> Result<Hash256, StorageError> {
        if height == 0 {
            return Ok(ZERO_HASH);
        }
        let value = self.primary()?.get(Namespace::HashHeight, &height_to_hash_key(height))?;
        decode_hash(&value, "block hash")
    }

    /// Height of the block with `hash`.
    pub fn get_block_height(&self, hash: &Hash256) -> Result<u64, StorageError> {
        let value = self.primary()?.get(Namespace::HashHeight, &hash_to_height_key(hash))?;
        decode_u64(&value, "block height")
    }

    /// Height of the tip.
    pub fn get_tip_height(&self) -> Result<u64, StorageError> {
        match self.primary()?.get(Namespace::Block, TIP_HEIGHT_KEY) {
            Ok(value) => decode_u64(&value, "tip height"),
            Err(StorageError::NotExist(_)) => Err(StorageError::Uninitialized("tip height")),
            Err(e) => Err(e),
        }
    }

    /// Hash of the tip.
    pub fn get_tip_hash(&self) -> Result<Hash256, StorageError> {
        match self.primary()?.get(Namespace::Block, TIP_HASH_KEY) {
            Ok(value) => decode_hash(&value, "tip hash"),
            Err(StorageError::NotExist(_)) => Err(StorageError::Uninitialized("tip hash")),
            Err(e) => Err(e),
        }
    }

    /// Store the receipts of the block at `height`. An empty batch is not written.
    pub fn put_receipts(&self, height: u64, receipts: &[Receipt]) -> Result<(), StorageError> {
        if receipts.is_empty() {
            return Ok(());
        }
        let store = self.receipt_store(height)?;
        store.put(Namespace::Receipts, &height_key(height), &serialize(&receipts)?)
    }

    /// Receipts of the block at `height`.
    pub fn get_receipts(&self, height: u64) -> Result<Vec<Receipt>, StorageError> {
        let store = self.receipt_store(height)?;
        let value = store.get(Namespace::Receipts, &height_key(height))?;
        if value.is_empty() {
            return Err(StorageError::NotExist(format!("receipts at height {height}")));
        }
        Ok(deserialize(&value)?)
    }

    /// Receipt of one action, located through the action index.
    pub fn get_receipt_by_action_hash(&self, hash: &Hash256) -> Result<Receipt, StorageError> {
        let indexer = self
            .indexer
            .as_ref()
            .ok_or_else(|| StorageError::Index("no block indexer configured".into()))?;
        let height = indexer.get_block_height_by_action_hash(hash)?;
        self.get_receipts(height)?
            .into_iter()
            .find(|receipt| &receipt.action_hash == hash)
            .ok_or_else(|| StorageError::ReceiptNotFound(hex::encode(hash)))
    }

    /// Remove the tip block and move the tip back by one.
    ///
    /// The store mutation is committed before index entries are removed. If
    /// index removal fails the block is still gone, the index keeps stale
    /// entries and an [`StorageError::Index`] is returned.
    pub fn delete_tip_block(&self) -> Result<(), StorageError> {
        let height = self.get_tip_height()?;
        if height == 0 {
            return Err(StorageError::CannotDeleteGenesis);
        }
        let hash = self.get_block_hash(height)?;
        let block = self.get_block(&hash)?;
        let prev_hash = self.get_block_hash(height - 1)?;

        let (store, index) = self.shard_for_height(height)?;
        let mut block_batch = WriteBatch::new();
        block_batch.delete(Namespace::Header, hash.to_vec());
        block_batch.delete(Namespace::Body, hash.to_vec());
        block_batch.delete(Namespace::Footer, hash.to_vec());
        block_batch.delete(Namespace::Receipts, height_key(height).to_vec());

        let mut primary_batch = WriteBatch::new();
        primary_batch.put(Namespace::Block, TIP_HEIGHT_KEY, height_key(height - 1).to_vec());
        primary_batch.put(Namespace::Block, TIP_HASH_KEY, prev_hash.to_vec());
        primary_batch.delete(Namespace::HashHeight, hash_to_height_key(&hash));
        primary_batch.delete(Namespace::HashHeight, height_to_hash_key(height));
        primary_batch.delete(Namespace::Block, height_to_shard_key(height));

        if index == 0 {
            block_batch.append(primary_batch);
            store.commit(block_batch)?;
        } else {
            store.commit(block_batch)?;
            self.primary()?.commit(primary_batch)?;
        }
        self.caches.evict(&hash);

        self.unindex_block(&block)?;
        info!(height, hash = %hex::encode(hash), "deleted tip block");
        Ok(())
    }

    fn primary(&self) -> Result<Arc<F::Store>, StorageError> {
        self.shards.get_opened(0).ok_or(StorageError::NotStarted)
    }

    /// Shard that receives a new block at `height`, rolling over to a fresh
    /// shard once the current one outgrows `split_db_size_bytes`.
    fn top_shard(&self, height: u64) -> Result<(Arc<F::Store>, u64), StorageError> {
        if !self.config.is_sharded(height) {
            return Ok((self.primary()?, 0));
        }

        let top = self.shards.top();
        if !self.shards.factory().exists(top) {
            return Ok((self.shards.get_or_open(top)?, top));
        }

        let store = self.shards.get_or_open(top)?;
        let size = store.size_on_disk()?;
        if size > self.config.split_db_size_bytes {
            let next = top + 1;
            let store = self.shards.get_or_open(next)?;
            self.shards.set_top(next);
            info!(shard = next, previous_size = size, "rolled over to new shard");
            return Ok((store, next));
        }
        Ok((store, top))
    }

    /// Shard holding the stored block at `height`.
    fn shard_for_height(&self, height: u64) -> Result<(Arc<F::Store>, u64), StorageError> {
        if !self.config.is_sharded(height) {
            return Ok((self.primary()?, 0));
        }
        let value = self.primary()?.get(Namespace::Block, &height_to_shard_key(height))?;
        let index = decode_u64(&value, "shard index")?;
        Ok((self.shards.get_or_open(index)?, index))
    }

    /// Shard holding the receipts of `height`. Receipts may be written before
    /// the height→shard mapping exists; those go to the current shard.
    fn receipt_store(&self, height: u64) -> Result<Arc<F::Store>, StorageError> {
        if !self.config.is_sharded(height) {
            return self.primary();
        }
        match self.primary()?.get(Namespace::Block, &height_to_shard_key(height)) {
            Ok(value) => self.shards.get_or_open(decode_u64(&value, "shard index")?),
            Err(StorageError::NotExist(_)) => {
                let top = self.shards.top();
                self.shards.get_opened(top).ok_or(StorageError::ShardNotOpened(top))
            }
            Err(e) => Err(e),
        }
    }

    fn cached_artifact<T>(
        &self,
        cache: &ArtifactCache<T>,
        kind: ArtifactKind,
        ns: Namespace,
        hash: &Hash256,
        op: &'static str,
    ) -> Result<T, StorageError>
    where
        T: Clone + DeserializeOwned,
    {
        if let Some(value) = cache.get(hash) {
            self.metrics.cache_hit(kind);
            return Ok(value);
        }
        self.metrics.cache_miss(kind);

        let value = self.get_block_value(ns, hash)?;
        if value.is_empty() {
            return Err(StorageError::NotExist(format!(
                "{} of block {}",
                ns.as_str(),
                hex::encode(hash)
            )));
        }
        let artifact: T = self.decode(&value, op)?;
        cache.put(*hash, artifact.clone());
        Ok(artifact)
    }

    fn get_block_value(&self, ns: Namespace, hash: &Hash256) -> Result<Vec<u8>, StorageError> {
        let height = self.get_block_height(hash)?;
        let (store, index) = self.shard_for_height(height)?;
        match store.get(ns, hash) {
            Err(StorageError::NotExist(_)) if index > 0 => {
                warn!(
                    bucket = ns.as_str(),
                    height,
                    shard = index,
                    "block artifact missing from its shard, reading previous shard"
                );
                self.shards.get_or_open(index - 1)?.get(ns, hash)
            }
            other => other,
        }
    }

    fn encode<T: Serialize>(&self, value: &T, op: &'static str) -> Result<Vec<u8>, StorageError> {
        let bytes = serialize(value)?;
        if !self.config.compress_block {
            return Ok(bytes);
        }
        let started = Instant::now();
        let compressed = compress(&bytes)?;
        self.metrics.observe(op, started.elapsed());
        Ok(compressed)
    }

    fn decode<T: DeserializeOwned>(&self, value: &[u8], op: &'static str) -> Result<T, StorageError> {
        if !self.config.compress_block {
            return Ok(deserialize(value)?);
        }
        let started = Instant::now();
        let bytes = decompress(value)?;
        self.metrics.observe(op, started.elapsed());
        Ok(deserialize(&bytes)?)
    }

    fn index_block(&self, block: &Block) -> Result<(), StorageError> {
        let indexer = match &self.indexer {
            Some(indexer) => indexer,
            None => return Ok(()),
        };
        let result = match self.config.index_mode {
            IndexMode::BlockOnly => indexer.index_block(block, false),
            IndexMode::BlockAndActions => indexer
                .index_block(block, true)
                .and_then(|_| indexer.index_action(block))
                .and_then(|_| indexer.commit()),
            IndexMode::External => Ok(()),
        };
        result.map_err(|e| StorageError::Index(format!("failed to index block {}: {e}", block.height())))
    }

    fn unindex_block(&self, block: &Block) -> Result<(), StorageError> {
        let indexer = match &self.indexer {
            Some(indexer) => indexer,
            None => return Ok(()),
        };
        let result = match self.config.index_mode {
            IndexMode::BlockOnly => indexer.delete_block_index(block),
            IndexMode::BlockAndActions => indexer
                .delete_action_index(block)
                .and_then(|_| indexer.delete_block_index(block)),
            IndexMode::External => Ok(()),
        };
        if let Err(e) = result {
            error!(
                height = block.height(),
                error = %e,
                "failed to remove deleted block from index, index entries left stale"
            );
            return Err(StorageError::Index(format!(
                "failed to unindex block {}: {e}",
                block.height()
            )));
        }
        Ok(())
    }
}
