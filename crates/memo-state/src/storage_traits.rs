//! Storage trait definitions for Memos
//!
//! These traits define the platform seams the tiers are built on:
//! - `KvArea`: one key/value storage area (synced, local or session)
//! - `SearchIndex`: the derived full-text cache over every memo
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::Memo;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Total bytes the synced area may hold.
pub const SYNC_QUOTA_BYTES: u64 = 102_400;

/// Bytes a single synced item may hold (key + JSON value).
pub const SYNC_QUOTA_BYTES_PER_ITEM: u64 = 8_192;

/// Total bytes the local area may hold.
pub const LOCAL_QUOTA_BYTES: u64 = 5_242_880;

// ---------------------------------------------------------------------------
// KvArea: platform key/value storage
// ---------------------------------------------------------------------------

/// Size limits a storage area enforces on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaQuota {
    /// Limit on the sum of all item sizes
    pub total_bytes: Option<u64>,
    /// Limit on a single item
    pub per_item_bytes: Option<u64>,
}

impl AreaQuota {
    /// No limits (session area).
    pub const fn unlimited() -> Self {
        AreaQuota {
            total_bytes: None,
            per_item_bytes: None,
        }
    }

    /// Limits of the replicated area.
    pub const fn sync() -> Self {
        AreaQuota {
            total_bytes: Some(SYNC_QUOTA_BYTES),
            per_item_bytes: Some(SYNC_QUOTA_BYTES_PER_ITEM),
        }
    }

    /// Limits of the local overflow area.
    pub const fn local() -> Self {
        AreaQuota {
            total_bytes: Some(LOCAL_QUOTA_BYTES),
            per_item_bytes: None,
        }
    }

    /// Bytes an item occupies: key length plus JSON length.
    pub fn item_size(key: &str, json: &str) -> u64 {
        (key.len() + json.len()) as u64
    }

    /// Check a write of `key` = `json` against the limits.
    ///
    /// `current_total` is the area's usage before the write and
    /// `previous_item` the size of the item being replaced (0 when new).
    pub fn check(
        &self,
        area: &str,
        key: &str,
        json: &str,
        current_total: u64,
        previous_item: u64,
    ) -> StorageResult<()> {
        let item = Self::item_size(key, json);
        if let Some(limit) = self.per_item_bytes {
            if item > limit {
                return Err(StorageError::ItemQuotaExceeded {
                    area: area.to_string(),
                    key: key.to_string(),
                    bytes: item,
                    quota: limit,
                });
            }
        }
        if let Some(limit) = self.total_bytes {
            let projected = current_total.saturating_sub(previous_item) + item;
            if projected > limit {
                return Err(StorageError::QuotaExceeded {
                    area: area.to_string(),
                    bytes: projected,
                    quota: limit,
                });
            }
        }
        Ok(())
    }
}

/// One key/value storage area.
///
/// Values are raw JSON strings; typed access lives in the tier adapters.
///
/// Guarantees:
/// - `set` either stores the whole value or fails without changing the area.
/// - `set` fails with a quota error when the area's `AreaQuota` would be exceeded.
/// - `remove` of a missing key is a no-op.
#[async_trait]
pub trait KvArea: Send + Sync {
    /// Area name used in logs and errors (e.g. "sync").
    fn name(&self) -> &str;

    /// Read the JSON stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `json` under `key`, replacing any previous value.
    async fn set(&self, key: &str, json: String) -> StorageResult<()>;

    /// Remove `key`. No-op if absent.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Sum of item sizes currently stored.
    async fn bytes_in_use(&self) -> StorageResult<u64>;
}

// ---------------------------------------------------------------------------
// SearchIndex: derived full-text cache
// ---------------------------------------------------------------------------

/// Full-text cache over the union of both memo tiers.
///
/// Never authoritative: it can always be rebuilt from the tiers.
///
/// Guarantees:
/// - `rebuild` replaces the whole content atomically; on failure the previous
///   content is left untouched.
/// - `search` is a case-insensitive substring match on title and content,
///   returned in ascending `updated_at` order without ranking.
/// - `is_available` never fails.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Clear the index and load `memos` in one transaction.
    async fn rebuild(&self, memos: &[Memo]) -> StorageResult<()>;

    /// Insert or replace one memo by id.
    async fn put(&self, memo: &Memo) -> StorageResult<()>;

    /// Remove one memo by id. No-op if absent.
    async fn delete(&self, id: &str) -> StorageResult<()>;

    /// Memos whose title or content contains `keyword`, ignoring case.
    async fn search(&self, keyword: &str) -> StorageResult<Vec<Memo>>;

    /// Whether the backing store can be reached.
    async fn is_available(&self) -> bool;
}

/// Shared matching rule for `SearchIndex::search` implementations.
pub fn matches_keyword(memo: &Memo, lowered_keyword: &str) -> bool {
    memo.title.to_lowercase().contains(lowered_keyword)
        || memo.content.to_lowercase().contains(lowered_keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_size_counts_key_and_value() {
        assert_eq!(AreaQuota::item_size("memos", "[]"), 7);
    }

    #[test]
    fn per_item_limit_rejects_large_items() {
        let quota = AreaQuota::sync();
        let big = "x".repeat(8_192);
        let err = quota.check("sync", "memos", &big, 0, 0).unwrap_err();
        assert!(matches!(err, StorageError::ItemQuotaExceeded { .. }));
    }

    #[test]
    fn total_limit_accounts_for_replaced_item() {
        let quota = AreaQuota {
            total_bytes: Some(100),
            per_item_bytes: None,
        };
        let value = "x".repeat(60);
        // 90 in use, of which 62 belong to the item being replaced
        quota.check("local", "k", &value, 90, 62).unwrap();
        let err = quota.check("local", "k2", &value, 90, 0).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { bytes: 152, .. }));
    }

    #[test]
    fn unlimited_accepts_anything() {
        let huge = "x".repeat(10 * 1024 * 1024);
        AreaQuota::unlimited()
            .check("session", "draft", &huge, u64::MAX / 2, 0)
            .unwrap();
    }
}
