use std::sync::Arc;

use super::{read_json, write_json};
use crate::storage_traits::{KvArea, StorageResult};

/// Key of the unsaved draft text.
pub const DRAFT_KEY: &str = "draft_content";

/// Key of the collapsed card ids.
pub const COLLAPSED_KEY: &str = "collapsed_memos";

/// Pass-through store for state that only lives as long as the browser session.
#[derive(Clone)]
pub struct SessionStore {
    area: Arc<dyn KvArea>,
}

impl SessionStore {
    pub fn new(area: Arc<dyn KvArea>) -> Self {
        Self { area }
    }

    pub async fn get_draft(&self) -> StorageResult<String> {
        let draft: Option<String> = read_json(self.area.as_ref(), DRAFT_KEY).await?;
        Ok(draft.unwrap_or_default())
    }

    pub async fn save_draft(&self, content: &str) -> StorageResult<()> {
        write_json(self.area.as_ref(), DRAFT_KEY, content).await
    }

    pub async fn clear_draft(&self) -> StorageResult<()> {
        self.area.remove(DRAFT_KEY).await
    }

    /// True when the draft holds anything besides whitespace.
    pub async fn has_draft(&self) -> StorageResult<bool> {
        Ok(!self.get_draft().await?.trim().is_empty())
    }

    pub async fn get_collapsed_ids(&self) -> StorageResult<Vec<String>> {
        let ids: Option<Vec<String>> = read_json(self.area.as_ref(), COLLAPSED_KEY).await?;
        Ok(ids.unwrap_or_default())
    }

    pub async fn save_collapsed_ids(&self, ids: &[String]) -> StorageResult<()> {
        write_json(self.area.as_ref(), COLLAPSED_KEY, ids).await
    }
}
