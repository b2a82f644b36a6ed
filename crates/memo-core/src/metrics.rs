//! Global atomic counters for storage engine activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when the host process exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    memos_saved: AtomicU64,
    tier_fallbacks: AtomicU64,
    migrations: AtomicU64,
    cache_errors: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            memos_saved: AtomicU64::new(0),
            tier_fallbacks: AtomicU64::new(0),
            migrations: AtomicU64::new(0),
            cache_errors: AtomicU64::new(0),
        }
    }

    /// A memo was created by `save_memo`.
    pub fn inc_saved(&self) {
        self.memos_saved.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "memos_saved", "counter incremented");
    }

    /// A memo landed in the local tier instead of the synced one.
    pub fn inc_fallbacks(&self) {
        self.tier_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tier_fallbacks", "counter incremented");
    }

    /// The synced tier was evicted into the local tier.
    pub fn inc_migrations(&self) {
        self.migrations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "migrations", "counter incremented");
    }

    /// A search-index operation failed and was swallowed.
    pub fn inc_cache_errors(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cache_errors", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            memos_saved = self.memos_saved(),
            tier_fallbacks = self.tier_fallbacks(),
            migrations = self.migrations(),
            cache_errors = self.cache_errors(),
        );
    }

    pub fn memos_saved(&self) -> u64 {
        self.memos_saved.load(Ordering::Relaxed)
    }

    pub fn tier_fallbacks(&self) -> u64 {
        self.tier_fallbacks.load(Ordering::Relaxed)
    }

    pub fn migrations(&self) -> u64 {
        self.migrations.load(Ordering::Relaxed)
    }

    pub fn cache_errors(&self) -> u64 {
        self.cache_errors.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.memos_saved.store(0, Ordering::Relaxed);
        self.tier_fallbacks.store(0, Ordering::Relaxed);
        self.migrations.store(0, Ordering::Relaxed);
        self.cache_errors.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_saved();
        m.inc_saved();
        m.inc_fallbacks();
        m.inc_cache_errors();
        assert_eq!(m.memos_saved(), 2);
        assert_eq!(m.tier_fallbacks(), 1);
        assert_eq!(m.migrations(), 0);
        assert_eq!(m.cache_errors(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_saved();
        m.inc_migrations();
        m.reset();
        assert_eq!(m.memos_saved(), 0);
        assert_eq!(m.migrations(), 0);
    }
}
