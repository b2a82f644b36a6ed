//! In-memory fakes for storage traits
//!
//! Provides `MemoryKvArea` and `MemorySearchIndex` that satisfy the trait
//! contracts without any external dependencies, plus `FlakyKvArea` for
//! exercising failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::Memo;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryKvArea
// ---------------------------------------------------------------------------

/// In-memory storage area backed by a `HashMap<key, json>`.
#[derive(Debug)]
pub struct MemoryKvArea {
    name: String,
    quota: AreaQuota,
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKvArea {
    pub fn new(name: impl Into<String>, quota: AreaQuota) -> Self {
        Self {
            name: name.into(),
            quota,
            items: Mutex::new(HashMap::new()),
        }
    }

    /// Area with the replicated-tier quota.
    pub fn sync() -> Self {
        Self::new("sync", AreaQuota::sync())
    }

    /// Area with the local-tier quota.
    pub fn local() -> Self {
        Self::new("local", AreaQuota::local())
    }

    /// Unlimited area for session data.
    pub fn session() -> Self {
        Self::new("session", AreaQuota::unlimited())
    }
}

#[async_trait]
impl KvArea for MemoryKvArea {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let items = self.items.lock().unwrap();
        Ok(items.get(key).cloned())
    }

    async fn set(&self, key: &str, json: String) -> StorageResult<()> {
        let mut items = self.items.lock().unwrap();
        let total: u64 = items
            .iter()
            .map(|(k, v)| AreaQuota::item_size(k, v))
            .sum();
        let previous = items
            .get(key)
            .map(|v| AreaQuota::item_size(key, v))
            .unwrap_or(0);
        self.quota.check(&self.name, key, &json, total, previous)?;
        items.insert(key.to_string(), json);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.lock().unwrap();
        items.remove(key);
        Ok(())
    }

    async fn bytes_in_use(&self) -> StorageResult<u64> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .map(|(k, v)| AreaQuota::item_size(k, v))
            .sum())
    }
}

// ---------------------------------------------------------------------------
// FlakyKvArea
// ---------------------------------------------------------------------------

/// Wraps another area and fails reads or writes on demand.
///
/// Also counts successful mutations so tests can assert which area an
/// operation touched.
pub struct FlakyKvArea {
    inner: Arc<dyn KvArea>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyKvArea {
    pub fn new(inner: Arc<dyn KvArea>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set`/`remove` calls that reached the inner area.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read_guard(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!(
                "injected read failure in {} area",
                self.inner.name()
            )));
        }
        Ok(())
    }

    fn write_guard(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!(
                "injected write failure in {} area",
                self.inner.name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KvArea for FlakyKvArea {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.read_guard()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, json: String) -> StorageResult<()> {
        self.write_guard()?;
        self.inner.set(key, json).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.write_guard()?;
        self.inner.remove(key).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn bytes_in_use(&self) -> StorageResult<u64> {
        self.read_guard()?;
        self.inner.bytes_in_use().await
    }
}

// ---------------------------------------------------------------------------
// MemorySearchIndex
// ---------------------------------------------------------------------------

/// In-memory search index backed by a `HashMap<id, Memo>`.
#[derive(Debug)]
pub struct MemorySearchIndex {
    records: Mutex<HashMap<String, Memo>>,
    available: AtomicBool,
}

impl Default for MemorySearchIndex {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away (every operation fails).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached copy of one memo.
    pub fn get(&self, id: &str) -> Option<Memo> {
        self.records.lock().unwrap().get(id).cloned()
    }

    fn guard(&self) -> StorageResult<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory index disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn rebuild(&self, memos: &[Memo]) -> StorageResult<()> {
        self.guard()?;
        let fresh: HashMap<String, Memo> = memos
            .iter()
            .map(|m| (m.id.clone(), m.detached()))
            .collect();
        *self.records.lock().unwrap() = fresh;
        Ok(())
    }

    async fn put(&self, memo: &Memo) -> StorageResult<()> {
        self.guard()?;
        let mut records = self.records.lock().unwrap();
        records.insert(memo.id.clone(), memo.detached());
        Ok(())
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        self.guard()?;
        let mut records = self.records.lock().unwrap();
        records.remove(id);
        Ok(())
    }

    async fn search(&self, keyword: &str) -> StorageResult<Vec<Memo>> {
        self.guard()?;
        let lowered = keyword.to_lowercase();
        let records = self.records.lock().unwrap();
        let mut hits: Vec<Memo> = records
            .values()
            .filter(|m| matches_keyword(m, &lowered))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
