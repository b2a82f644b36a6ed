//! Shared harness: an engine over inspectable in-memory areas.

#![allow(dead_code)]

use std::sync::Arc;

use memo_core::{SequentialIds, StorageEngine};
use memo_state::fakes::{FlakyKvArea, MemoryKvArea, MemorySearchIndex};
use memo_state::{LocalTier, Memo, MemoKind, NewMemo, SyncTier};

pub struct Harness {
    pub sync: Arc<FlakyKvArea>,
    pub local: Arc<FlakyKvArea>,
    pub index: Arc<MemorySearchIndex>,
    pub engine: StorageEngine,
}

impl Harness {
    pub fn new() -> Self {
        let sync = Arc::new(FlakyKvArea::new(Arc::new(MemoryKvArea::sync())));
        let local = Arc::new(FlakyKvArea::new(Arc::new(MemoryKvArea::local())));
        let index = Arc::new(MemorySearchIndex::new());
        let engine = StorageEngine::new(
            sync.clone(),
            local.clone(),
            Arc::new(MemoryKvArea::session()),
            index.clone(),
        )
        .with_ids(Arc::new(SequentialIds::new("m")));
        Self {
            sync,
            local,
            index,
            engine,
        }
    }

    pub fn sync_tier(&self) -> SyncTier {
        SyncTier::new(self.sync.clone())
    }

    pub fn local_tier(&self) -> LocalTier {
        LocalTier::new(self.local.clone())
    }

    pub async fn synced(&self) -> Vec<Memo> {
        self.sync_tier().read().await.unwrap().memos
    }

    pub async fn local_memos(&self) -> Vec<Memo> {
        self.local_tier().read().await.unwrap()
    }
}

pub fn new_text(content: &str) -> NewMemo {
    let title: String = content.chars().take(15).collect();
    NewMemo::text(content, title, 1_000)
}

pub fn stored(id: &str, content: &str, updated_at: i64) -> Memo {
    Memo {
        id: id.to_string(),
        content: content.to_string(),
        title: content.chars().take(15).collect(),
        kind: MemoKind::Text,
        metadata: None,
        created_at: updated_at,
        updated_at,
        local_only: false,
        hidden: None,
    }
}
