//! Router statistics

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of routing decisions since the router was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRouterStats {
    /// Same-origin requests answered from the cache
    pub hits: u64,

    /// Same-origin requests that had to go to the network
    pub misses: u64,

    /// Requests routed to the network without consulting the cache
    pub passthroughs: u64,

    /// Background write-backs that failed to store
    pub write_back_failures: u64,
}

impl CacheRouterStats {
    /// Fraction of cacheable requests served from the cache.
    pub fn hit_ratio(&self) -> f64 {
        let cacheable = self.hits + self.misses;
        if cacheable == 0 {
            return 0.0;
        }
        self.hits as f64 / cacheable as f64
    }

    /// Total requests seen by the router.
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses + self.passthroughs
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    passthroughs: AtomicU64,
    write_back_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn passthrough(&self) {
        self.passthroughs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn write_back_failed(&self) {
        self.write_back_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheRouterStats {
        CacheRouterStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            passthroughs: self.passthroughs.load(Ordering::Relaxed),
            write_back_failures: self.write_back_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let stats = CacheRouterStats {
            hits: 3,
            misses: 1,
            passthroughs: 10,
            write_back_failures: 0,
        };
        assert_eq!(stats.hit_ratio(), 0.75);
        assert_eq!(stats.total_requests(), 14);
        assert_eq!(CacheRouterStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = Counters::default();
        counters.hit();
        counters.miss();
        counters.miss();
        counters.write_back_failed();
        let snap = counters.snapshot();
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 2);
        assert_eq!(snap.passthroughs, 0);
        assert_eq!(snap.write_back_failures, 1);
    }
}
