//! Structured observability hooks for storage lifecycle events.
//!
//! Events are emitted at `info!` level, failures at `warn!`. Every event
//! carries an `event` field so log pipelines can filter on it.

use memo_state::StorageTier;
use tracing::{info, warn};

/// Emit event: memo stored in a tier.
pub fn emit_memo_saved(id: &str, tier: StorageTier, bytes: usize) {
    info!(event = "memo.saved", memo_id = %id, tier = %tier, bytes = bytes);
}

/// Emit event: memo routed to the local tier instead of the synced one.
pub fn emit_tier_fallback(id: &str, reason: &str) {
    info!(event = "memo.tier_fallback", memo_id = %id, reason = %reason);
}

/// Emit event: synced tier evicted into the local tier.
pub fn emit_migrated(count: usize, bytes: usize) {
    info!(event = "storage.migrated", count = count, bytes = bytes);
}

/// Emit event: eviction check failed (warn level, never fatal).
pub fn emit_migration_failed(error: &dyn std::fmt::Display) {
    warn!(event = "storage.migration_failed", error = %error);
}

/// Emit event: import batch finished.
pub fn emit_import_finished(imported: usize, skipped: usize, errors: usize) {
    info!(
        event = "import.finished",
        imported = imported,
        skipped = skipped,
        errors = errors,
    );
}

/// Emit event: search-index operation failed (warn level, swallowed).
pub fn emit_cache_error(op: &str, error: &dyn std::fmt::Display) {
    warn!(event = "cache.error", op = %op, error = %error);
}
