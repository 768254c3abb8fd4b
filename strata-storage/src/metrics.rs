//! Block store instrumentation.
//!
//! The store reports cache hits and misses and the duration of timed steps
//! (compression, decompression, block writes) to an injected
//! [`StoreMetrics`] sink. [`PrometheusMetrics`] registers on a caller-owned
//! [`prometheus::Registry`]; [`CountingMetrics`] keeps plain counters that
//! tests can assert on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Cached block artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Block header.
    Header,
    /// Block body.
    Body,
    /// Block footer.
    Footer,
}

impl ArtifactKind {
    fn slot(self) -> usize {
        match self {
            ArtifactKind::Header => 0,
            ArtifactKind::Body => 1,
            ArtifactKind::Footer => 2,
        }
    }

    fn hit_label(self) -> &'static str {
        match self {
            ArtifactKind::Header => "hit_header",
            ArtifactKind::Body => "hit_body",
            ArtifactKind::Footer => "hit_footer",
        }
    }

    fn miss_label(self) -> &'static str {
        match self {
            ArtifactKind::Header => "miss_header",
            ArtifactKind::Body => "miss_body",
            ArtifactKind::Footer => "miss_footer",
        }
    }
}

/// Sink for block store observations.
pub trait StoreMetrics: Send + Sync {
    /// An artifact was served from cache.
    fn cache_hit(&self, kind: ArtifactKind);

    /// An artifact read was not served from cache.
    fn cache_miss(&self, kind: ArtifactKind);

    /// A timed step finished; `op` is e.g. `compress_header`.
    fn observe(&self, op: &'static str, elapsed: Duration);
}

/// Discards every observation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl StoreMetrics for NoopMetrics {
    fn cache_hit(&self, _kind: ArtifactKind) {}

    fn cache_miss(&self, _kind: ArtifactKind) {}

    fn observe(&self, _op: &'static str, _elapsed: Duration) {}
}

/// In-process counters.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    hits: [AtomicU64; 3],
    misses: [AtomicU64; 3],
    observations: Mutex<HashMap<&'static str, u64>>,
}

impl CountingMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hits recorded for `kind`.
    pub fn hits(&self, kind: ArtifactKind) -> u64 {
        self.hits[kind.slot()].load(Ordering::Relaxed)
    }

    /// Cache misses recorded for `kind`.
    pub fn misses(&self, kind: ArtifactKind) -> u64 {
        self.misses[kind.slot()].load(Ordering::Relaxed)
    }

    /// How many times `op` was timed.
    pub fn observations(&self, op: &str) -> u64 {
        self.observations.lock().get(op).copied().unwrap_or(0)
    }
}

impl StoreMetrics for CountingMetrics {
    fn cache_hit(&self, kind: ArtifactKind) {
        self.hits[kind.slot()].fetch_add(1, Ordering::Relaxed);
    }

    fn cache_miss(&self, kind: ArtifactKind) {
        self.misses[kind.slot()].fetch_add(1, Ordering::Relaxed);
    }

    fn observe(&self, op: &'static str, _elapsed: Duration) {
        *self.observations.lock().entry(op).or_insert(0) += 1;
    }
}

/// Prometheus-backed sink.
#[derive(Clone)]
pub struct PrometheusMetrics {
    cache: IntCounterVec,
    durations: HistogramVec,
}

impl PrometheusMetrics {
    /// Create the block store metrics and register them on `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let cache = IntCounterVec::new(
            Opts::new("strata_blockdao_cache", "Block store cache hits and misses"),
            &["result"],
        )?;
        registry.register(Box::new(cache.clone()))?;

        let durations = HistogramVec::new(
            HistogramOpts::new(
                "strata_blockdao_duration_seconds",
                "Duration of block store steps in seconds",
            ),
            &["type"],
        )?;
        registry.register(Box::new(durations.clone()))?;

        Ok(Self { cache, durations })
    }
}

impl StoreMetrics for PrometheusMetrics {
    fn cache_hit(&self, kind: ArtifactKind) {
        self.cache.with_label_values(&[kind.hit_label()]).inc();
    }

    fn cache_miss(&self, kind: ArtifactKind) {
        self.cache.with_label_values(&[kind.miss_label()]).inc();
    }

    fn observe(&self, op: &'static str, elapsed: Duration) {
        self.durations
            .with_label_values(&[op])
            .observe(elapsed.as_secs_f64());
    }
}
