//! # Strata Storage
//!
//! Persistent block storage for the Strata ledger.
//!
//! This crate provides:
//! - Bucketed key-value stores backed by RocksDB or memory
//! - The block store: header/body/footer and receipt persistence by hash and height
//! - Size-based sharding of history into numbered database files
//! - Optional zstd compression and LRU caching of block artifacts
//! - Block and action indexing
//!
//! ## Architecture
//!
//! The primary store (shard 0) holds the tip pointers and every
//! hash↔height↔shard mapping. Block artifacts live in the primary store up
//! to `split_db_height` and in numbered shard stores above it; a new shard
//! is started once the current one outgrows `split_db_size_bytes`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod compress;
pub mod config;
pub mod error;
pub mod keys;
pub mod kv;
pub mod metrics;

pub use block::{BlockDao, BlockIndexer, KvIndexer, MemoryShardFactory, RocksShardFactory, ShardFactory};
pub use config::{DbConfig, IndexMode};
pub use error::StorageError;
pub use keys::Namespace;
pub use kv::{BatchOp, KvStore, MemoryBackend, RocksBackend, WriteBatch};
pub use metrics::{ArtifactKind, CountingMetrics, NoopMetrics, PrometheusMetrics, StoreMetrics};
