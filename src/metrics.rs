//! Memoizer counters.
//!
//! Each memoizer owns a [`MemoMetrics`] recorder; bound views of a method
//! memoizer record into their template's counters. Counters are relaxed
//! atomics: observational only, never used for correctness.
//!
//! Compiled only with the `metrics` feature, which is on by default.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of memoizer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoMetricsSnapshot {
    /// Cached calls answered from a recorded state.
    pub hits: u64,
    /// Cached calls that found nothing and ran the callable.
    pub misses: u64,
    /// Explicit forced calls.
    pub forced: u64,
    /// Raw calls bypassing the cache.
    pub raw: u64,
    /// Failures recorded in the cache.
    pub errors_cached: u64,
    /// Failures masked by serving the previous result.
    pub stale_served: u64,
}

impl MemoMetricsSnapshot {
    /// Fraction of cached calls answered without running the callable.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Atomic counters for one memoizer.
#[derive(Debug, Default)]
pub struct MemoMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    forced: AtomicU64,
    raw: AtomicU64,
    errors_cached: AtomicU64,
    stale_served: AtomicU64,
}

impl MemoMetrics {
    pub fn snapshot(&self) -> MemoMetricsSnapshot {
        MemoMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            forced: self.forced.load(Ordering::Relaxed),
            raw: self.raw.load(Ordering::Relaxed),
            errors_cached: self.errors_cached.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn inc_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_forced(&self) {
        self.forced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_raw(&self) {
        self.raw.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_error_cached(&self) {
        self.errors_cached.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_stale_served(&self) {
        self.stale_served.fetch_add(1, Ordering::Relaxed);
    }
}
