//! Storage engine: tiering policy across the synced, local and search tiers.
//!
//! The engine decides which tier owns each memo, merges both memo tiers into
//! one view and keeps the search index as a derived cache. Search-index
//! failures are logged and never surfaced; read failures of the memo tiers
//! propagate to the caller.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use memo_state::fakes::{MemoryKvArea, MemorySearchIndex};
use memo_state::{
    collection_size, serialized_size, KvArea, LocalTier, Memo, NewMemo, SearchIndex,
    SessionStore, StorageResult, StorageTier, StorageUsage, StoreHandle, SurrealHandle,
    SyncTier, UserSettings,
};

use crate::config::{TierLimits, MAX_MEMO_BYTES, SYNC_USAGE_THRESHOLD};
use crate::ids::{IdGenerator, RandomIds};
use crate::import::{ImportStrategy, ImportSummary};
use crate::metrics::METRICS;
use crate::obs;

/// Result of an eviction check on the synced tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Synced tier empty or within the eviction limit
    Skipped,
    /// Every synced memo moved to the local tier
    Migrated { count: usize },
    /// The check failed; storage was left as it was found
    Failed,
}

/// Orchestrates reads and writes across the storage tiers.
#[derive(Clone)]
pub struct StorageEngine {
    sync: SyncTier,
    local: LocalTier,
    session: SessionStore,
    index: Arc<dyn SearchIndex>,
    ids: Arc<dyn IdGenerator>,
    limits: TierLimits,
}

impl StorageEngine {
    pub fn new(
        sync: Arc<dyn KvArea>,
        local: Arc<dyn KvArea>,
        session: Arc<dyn KvArea>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            sync: SyncTier::new(sync),
            local: LocalTier::new(local),
            session: SessionStore::new(session),
            index,
            ids: Arc::new(RandomIds),
            limits: TierLimits::default(),
        }
    }

    /// Engine over in-memory fakes with the platform quotas.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryKvArea::sync()),
            Arc::new(MemoryKvArea::local()),
            Arc::new(MemoryKvArea::session()),
            Arc::new(MemorySearchIndex::new()),
        )
    }

    /// Engine over the memo tiers and index of whichever backend `store` opened.
    pub fn from_store(store: &StoreHandle, session: Arc<dyn KvArea>) -> Self {
        Self::new(
            store.sync_area(),
            store.local_area(),
            session,
            store.search_index(),
        )
    }

    /// Engine over SurrealDB-backed memo tiers and index.
    pub fn from_surreal(handle: &SurrealHandle, session: Arc<dyn KvArea>) -> Self {
        Self::new(
            Arc::new(handle.sync_area()),
            Arc::new(handle.local_area()),
            session,
            Arc::new(handle.search_index()),
        )
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_limits(mut self, limits: TierLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> TierLimits {
        self.limits
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // -- merged view ---------------------------------------------------------

    /// Both memo tiers merged, newest `updated_at` first.
    ///
    /// Equal timestamps keep encounter order: synced memos before local ones.
    #[instrument(skip(self))]
    pub async fn get_all_memos(&self) -> StorageResult<Vec<Memo>> {
        let (synced, local) = tokio::try_join!(self.sync.read(), self.local.read())?;

        let mut memos: Vec<Memo> = synced
            .memos
            .into_iter()
            .map(|m| with_tier(m, StorageTier::Sync))
            .chain(local.into_iter().map(|m| with_tier(m, StorageTier::Local)))
            .collect();
        memos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        debug!(count = memos.len(), "merged memo view loaded");
        Ok(memos)
    }

    /// First url memo whose `metadata.url` equals `url` exactly.
    pub async fn find_memo_by_url(&self, url: &str) -> StorageResult<Option<Memo>> {
        let memos = self.get_all_memos().await?;
        Ok(memos.into_iter().find(|m| m.url() == Some(url)))
    }

    // -- mutations -----------------------------------------------------------

    /// Store a new memo, assigning its id and owning tier.
    #[instrument(skip(self, new))]
    pub async fn save_memo(&self, new: NewMemo) -> StorageResult<Memo> {
        let mut memo = Memo::from_new(self.ids.next_id(), new).detached();

        let mut candidate = self.sync.read().await?.memos;
        candidate.push(memo.clone());
        let projected = collection_size(&candidate)?;

        let fallback_reason = if memo.local_only {
            None
        } else if projected >= self.limits.admit_bytes {
            Some(format!("projected {projected} bytes reaches admission limit"))
        } else {
            match self.sync.write(&candidate).await {
                Ok(()) => {
                    obs::emit_memo_saved(&memo.id, StorageTier::Sync, projected);
                    METRICS.inc_saved();
                    self.cache_put(&memo).await;
                    return Ok(memo);
                }
                Err(e) => Some(e.to_string()),
            }
        };

        memo.local_only = true;
        self.local.add(&memo).await?;
        if let Some(reason) = fallback_reason {
            obs::emit_tier_fallback(&memo.id, &reason);
            METRICS.inc_fallbacks();
        }
        obs::emit_memo_saved(&memo.id, StorageTier::Local, serialized_size(&memo)?);
        METRICS.inc_saved();
        self.cache_put(&memo).await;
        Ok(memo)
    }

    /// Persist an edited memo, moving it to the local tier when the synced
    /// tier can no longer hold it.
    #[instrument(skip(self, memo), fields(id = %memo.id))]
    pub async fn update_memo(&self, memo: &Memo) -> StorageResult<Memo> {
        let mut updated = memo.detached();
        updated.updated_at = now_millis().max(memo.updated_at.saturating_add(1));

        if updated.local_only {
            self.local.add(&updated).await?;
            self.cache_put(&updated).await;
            return Ok(updated);
        }

        let mut synced = self.sync.read().await?.memos;
        match synced.iter().position(|m| m.id == updated.id) {
            Some(idx) => {
                synced[idx] = updated.clone();
                let size = collection_size(&synced)?;
                if size > self.limits.update_bytes {
                    let reason = format!("{size} bytes exceeds update limit");
                    self.evict_one(&mut updated, synced, idx, &reason).await?;
                } else {
                    let written = self.sync.write(&synced).await;
                    match written {
                        Ok(()) => {}
                        Err(e) if e.is_quota() => {
                            let reason = e.to_string();
                            self.evict_one(&mut updated, synced, idx, &reason).await?;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            None => {
                updated.local_only = true;
                self.local.add(&updated).await?;
                obs::emit_tier_fallback(&updated.id, "not present in synced tier");
                METRICS.inc_fallbacks();
            }
        }

        self.cache_put(&updated).await;
        Ok(updated)
    }

    /// Remove a memo from its owning tier and from the index.
    #[instrument(skip(self, memo), fields(id = %memo.id))]
    pub async fn delete_memo(&self, memo: &Memo) -> StorageResult<()> {
        if memo.local_only {
            self.local.delete(&memo.id).await?;
        } else {
            let mut synced = self.sync.read().await?.memos;
            let before = synced.len();
            synced.retain(|m| m.id != memo.id);
            if synced.len() != before {
                self.sync.write(&synced).await?;
            }
        }
        self.cache_delete(&memo.id).await;
        Ok(())
    }

    // -- cold start ----------------------------------------------------------

    /// Move the whole synced tier into the local tier once it grows past the
    /// eviction limit. Never fails; problems are logged.
    #[instrument(skip(self))]
    pub async fn migrate_if_needed(&self) -> MigrationOutcome {
        match self.try_migrate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                obs::emit_migration_failed(&e);
                MigrationOutcome::Failed
            }
        }
    }

    async fn try_migrate(&self) -> StorageResult<MigrationOutcome> {
        let synced = self.sync.read().await?.memos;
        if synced.is_empty() {
            return Ok(MigrationOutcome::Skipped);
        }
        let size = collection_size(&synced)?;
        if size <= self.limits.migrate_bytes {
            return Ok(MigrationOutcome::Skipped);
        }

        let count = synced.len();
        let mut local = self.local.read().await?;
        for memo in synced {
            upsert_by_id(&mut local, with_tier(memo, StorageTier::Local));
        }
        self.local.write(&local).await?;
        self.sync.write(&[]).await?;

        obs::emit_migrated(count, size);
        METRICS.inc_migrations();
        Ok(MigrationOutcome::Migrated { count })
    }

    /// Cold-start entry point: evict if needed, load the merged view and
    /// rebuild the search index from it. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn init_storage(&self) -> StorageResult<Vec<Memo>> {
        self.migrate_if_needed().await;
        let memos = self.get_all_memos().await?;
        self.cache_rebuild(&memos).await;
        Ok(memos)
    }

    /// Seed the synced tier with an empty list and default settings.
    pub async fn install_defaults(&self) -> StorageResult<bool> {
        self.sync.install_defaults().await
    }

    // -- import / export -----------------------------------------------------

    /// Bulk import. Every written memo lands in the local tier.
    ///
    /// A failed batch write turns every counted import into an error; memos
    /// that already reached storage are not rolled back.
    #[instrument(skip(self, memos), fields(count = memos.len(), strategy = %strategy))]
    pub async fn import_memos(
        &self,
        memos: Vec<Memo>,
        strategy: ImportStrategy,
    ) -> StorageResult<ImportSummary> {
        let existing: HashSet<String> = self
            .get_all_memos()
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let mut summary = ImportSummary::default();
        let mut queued = Vec::with_capacity(memos.len());
        for incoming in memos {
            let mut memo = incoming.detached();
            if existing.contains(&memo.id) {
                match strategy {
                    ImportStrategy::Skip => {
                        summary.skipped += 1;
                        continue;
                    }
                    ImportStrategy::Overwrite => {}
                    ImportStrategy::Duplicate => memo.id = self.ids.next_id(),
                }
            }
            memo.local_only = true;
            queued.push(memo);
            summary.imported += 1;
        }

        if !queued.is_empty() {
            if let Err(e) = self.write_import_batch(&queued).await {
                warn!(error = %e, "import batch write failed");
                summary.errors += summary.imported;
                summary.imported = 0;
            }
            match self.get_all_memos().await {
                Ok(all) => self.cache_rebuild(&all).await,
                Err(e) => {
                    obs::emit_cache_error("rebuild", &e);
                    METRICS.inc_cache_errors();
                }
            }
        }

        obs::emit_import_finished(summary.imported, summary.skipped, summary.errors);
        Ok(summary)
    }

    async fn write_import_batch(&self, queued: &[Memo]) -> StorageResult<()> {
        let mut local = self.local.read().await?;
        for memo in queued {
            upsert_by_id(&mut local, memo.clone());
        }
        self.local.write(&local).await?;

        // Overwritten ids that the synced tier owned now live in the local tier.
        let moved: HashSet<&str> = queued.iter().map(|m| m.id.as_str()).collect();
        let mut synced = self.sync.read().await?.memos;
        let before = synced.len();
        synced.retain(|m| !moved.contains(m.id.as_str()));
        if synced.len() != before {
            self.sync.write(&synced).await?;
        }
        Ok(())
    }

    /// Merged view with routing markers cleared, ready to serialize.
    pub async fn export_memos(&self) -> StorageResult<Vec<Memo>> {
        Ok(self
            .get_all_memos()
            .await?
            .into_iter()
            .map(|mut m| {
                m.local_only = false;
                m
            })
            .collect())
    }

    // -- settings and usage --------------------------------------------------

    pub async fn settings(&self) -> StorageResult<UserSettings> {
        Ok(self.sync.read().await?.settings)
    }

    pub async fn save_settings(&self, settings: &UserSettings) -> StorageResult<()> {
        self.sync.save_settings(settings).await
    }

    pub async fn sync_usage(&self) -> StorageResult<StorageUsage> {
        self.sync.usage().await
    }

    /// Whether the synced tier has room for `memo`: the memo stays under the
    /// per-memo limit and current usage is below the threshold ratio.
    pub async fn can_fit_in_sync(&self, memo: &Memo) -> StorageResult<bool> {
        if serialized_size(memo)? > MAX_MEMO_BYTES {
            return Ok(false);
        }
        Ok(self.sync_usage().await?.percentage < SYNC_USAGE_THRESHOLD)
    }

    // -- search --------------------------------------------------------------

    /// Case-insensitive substring search served by the index.
    pub async fn search_memos(&self, keyword: &str) -> StorageResult<Vec<Memo>> {
        self.index.search(keyword).await
    }

    pub async fn is_index_available(&self) -> bool {
        self.index.is_available().await
    }

    // -- private helpers -----------------------------------------------------

    /// Move the synced memo at `idx` to the local tier. The local write goes
    /// first so a failure in between leaves a copy in at least one tier.
    async fn evict_one(
        &self,
        updated: &mut Memo,
        mut synced: Vec<Memo>,
        idx: usize,
        reason: &str,
    ) -> StorageResult<()> {
        updated.local_only = true;
        self.local.add(updated).await?;
        synced.remove(idx);
        self.sync.write(&synced).await?;
        obs::emit_tier_fallback(&updated.id, reason);
        METRICS.inc_fallbacks();
        Ok(())
    }

    async fn cache_put(&self, memo: &Memo) {
        if let Err(e) = self.index.put(memo).await {
            obs::emit_cache_error("put", &e);
            METRICS.inc_cache_errors();
        }
    }

    async fn cache_delete(&self, id: &str) {
        if let Err(e) = self.index.delete(id).await {
            obs::emit_cache_error("delete", &e);
            METRICS.inc_cache_errors();
        }
    }

    async fn cache_rebuild(&self, memos: &[Memo]) {
        if let Err(e) = self.index.rebuild(memos).await {
            obs::emit_cache_error("rebuild", &e);
            METRICS.inc_cache_errors();
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Routing marker always follows the tier a memo was read from.
fn with_tier(mut memo: Memo, tier: StorageTier) -> Memo {
    memo.local_only = tier == StorageTier::Local;
    memo
}

/// Replace in place when the id is present, else append.
fn upsert_by_id(memos: &mut Vec<Memo>, memo: Memo) {
    match memos.iter().position(|m| m.id == memo.id) {
        Some(idx) => memos[idx] = memo,
        None => memos.push(memo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_state::MemoKind;

    fn memo(id: &str, updated_at: i64) -> Memo {
        Memo {
            id: id.to_string(),
            content: id.to_string(),
            title: id.to_string(),
            kind: MemoKind::Text,
            metadata: None,
            created_at: updated_at,
            updated_at,
            local_only: false,
            hidden: None,
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut memos = vec![memo("a", 1), memo("b", 2)];
        upsert_by_id(&mut memos, memo("a", 9));
        upsert_by_id(&mut memos, memo("c", 3));
        let ids: Vec<(&str, i64)> = memos
            .iter()
            .map(|m| (m.id.as_str(), m.updated_at))
            .collect();
        assert_eq!(ids, vec![("a", 9), ("b", 2), ("c", 3)]);
    }

    #[test]
    fn with_tier_rewrites_marker() {
        let mut m = memo("a", 1);
        m.local_only = true;
        assert!(!with_tier(m.clone(), StorageTier::Sync).local_only);
        assert!(with_tier(memo("a", 1), StorageTier::Local).local_only);
    }

    #[tokio::test]
    async fn empty_engine_has_no_memos() {
        let engine = StorageEngine::in_memory();
        assert!(engine.init_storage().await.unwrap().is_empty());
        assert_eq!(engine.migrate_if_needed().await, MigrationOutcome::Skipped);
        assert!(engine.is_index_available().await);
    }
}
