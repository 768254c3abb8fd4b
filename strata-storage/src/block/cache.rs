//! Bounded LRU caches for decoded block artifacts.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use strata_core::{BlockBody, BlockFooter, BlockHeader, Hash256};

/// An LRU cache keyed by block hash. A capacity of zero disables it.
pub(crate) struct ArtifactCache<T> {
    inner: Option<Mutex<LruCache<Hash256, T>>>,
}

impl<T: Clone> ArtifactCache<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub(crate) fn get(&self, hash: &Hash256) -> Option<T> {
        self.inner.as_ref()?.lock().get(hash).cloned()
    }

    pub(crate) fn put(&self, hash: Hash256, value: T) {
        if let Some(cache) = &self.inner {
            cache.lock().put(hash, value);
        }
    }

    pub(crate) fn evict(&self, hash: &Hash256) {
        if let Some(cache) = &self.inner {
            cache.lock().pop(hash);
        }
    }
}

/// Header, body and footer caches of one block store.
pub(crate) struct BlockCaches {
    pub(crate) header: ArtifactCache<BlockHeader>,
    pub(crate) body: ArtifactCache<BlockBody>,
    pub(crate) footer: ArtifactCache<BlockFooter>,
}

impl BlockCaches {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            header: ArtifactCache::new(capacity),
            body: ArtifactCache::new(capacity),
            footer: ArtifactCache::new(capacity),
        }
    }

    pub(crate) fn evict(&self, hash: &Hash256) {
        self.header.evict(hash);
        self.body.evict(hash);
        self.footer.evict(hash);
    }
}
