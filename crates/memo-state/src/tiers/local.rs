use std::sync::Arc;

use tracing::instrument;

use super::{read_json, write_json};
use crate::schema::Memo;
use crate::storage_traits::{KvArea, StorageResult};

/// Key of the overflow memo list.
pub const LOCAL_MEMOS_KEY: &str = "local_memos";

/// Tier B: the larger, non-replicated overflow list.
///
/// No admission logic lives here; only the area's own quota applies.
#[derive(Clone)]
pub struct LocalTier {
    area: Arc<dyn KvArea>,
}

impl LocalTier {
    pub fn new(area: Arc<dyn KvArea>) -> Self {
        Self { area }
    }

    pub async fn read(&self) -> StorageResult<Vec<Memo>> {
        let memos: Option<Vec<Memo>> = read_json(self.area.as_ref(), LOCAL_MEMOS_KEY).await?;
        Ok(memos.unwrap_or_default())
    }

    /// Overwrite the whole list.
    #[instrument(skip(self, memos), fields(count = memos.len()))]
    pub async fn write(&self, memos: &[Memo]) -> StorageResult<()> {
        write_json(self.area.as_ref(), LOCAL_MEMOS_KEY, memos).await
    }

    /// Upsert by id: replace in place when present, else append.
    #[instrument(skip(self, memo), fields(id = %memo.id))]
    pub async fn add(&self, memo: &Memo) -> StorageResult<()> {
        let mut memos = self.read().await?;
        match memos.iter().position(|m| m.id == memo.id) {
            Some(idx) => memos[idx] = memo.clone(),
            None => memos.push(memo.clone()),
        }
        self.write(&memos).await
    }

    /// Remove by id. No-op if absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        let mut memos = self.read().await?;
        let before = memos.len();
        memos.retain(|m| m.id != id);
        if memos.len() == before {
            return Ok(());
        }
        self.write(&memos).await
    }
}
