//! Block storage.
//!
//! - [`BlockDao`]: block and receipt store with sharding, compression and caching
//! - [`ShardFactory`]: creates the stores behind shard indexes
//! - [`BlockIndexer`]: block and action index maintained alongside the store

mod cache;
mod dao;
mod index;
mod shard;

pub use dao::BlockDao;
pub use index::{BlockIndexer, KvIndexer};
pub use shard::{MemoryShardFactory, RocksShardFactory, ShardFactory};
