//! Application state owned by one explicit context object.
//!
//! Holds the memo list, loading flag, search query and collapsed cards that
//! a UI layer renders from, and routes every mutation through the engine.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use memo_state::{Memo, StorageResult};

use crate::coalesce::Coalescer;
use crate::engine::StorageEngine;
use crate::parsers::{parse_input, MetadataFetcher};

pub struct AppContext {
    engine: StorageEngine,
    fetcher: Arc<dyn MetadataFetcher>,
    memos: Vec<Memo>,
    loading: bool,
    query: String,
    collapsed: BTreeSet<String>,
}

impl AppContext {
    pub fn new(engine: StorageEngine, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            engine,
            fetcher,
            memos: Vec::new(),
            loading: true,
            query: String::new(),
            collapsed: BTreeSet::new(),
        }
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    pub fn memos(&self) -> &[Memo] {
        &self.memos
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Cold start: initialize storage and restore the collapsed cards.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> StorageResult<()> {
        self.loading = true;
        let loaded = self.engine.init_storage().await;
        self.loading = false;
        self.memos = loaded?;
        self.collapsed = self
            .engine
            .session()
            .get_collapsed_ids()
            .await?
            .into_iter()
            .collect();
        Ok(())
    }

    pub async fn reload(&mut self) -> StorageResult<()> {
        self.memos = self.engine.get_all_memos().await?;
        Ok(())
    }

    // -- list maintenance ----------------------------------------------------

    pub fn add_memo(&mut self, memo: Memo) {
        self.memos.insert(0, memo);
    }

    /// Replace by id and move to the front.
    pub fn replace_memo(&mut self, memo: Memo) {
        self.memos.retain(|m| m.id != memo.id);
        self.memos.insert(0, memo);
    }

    pub fn remove_memo(&mut self, id: &str) {
        self.memos.retain(|m| m.id != id);
    }

    // -- engine round trips --------------------------------------------------

    /// Parse free input, store it, and put it at the top of the list.
    ///
    /// Blank input stores nothing.
    #[instrument(skip(self, input))]
    pub async fn capture(&mut self, input: &str) -> StorageResult<Option<Memo>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let parsed = parse_input(input, self.fetcher.as_ref()).await;
        let now = chrono::Utc::now().timestamp_millis();
        let memo = self.engine.save_memo(parsed.into_new_memo(now)).await?;
        self.add_memo(memo.clone());
        Ok(Some(memo))
    }

    pub async fn edit(&mut self, memo: &Memo) -> StorageResult<Memo> {
        let updated = self.engine.update_memo(memo).await?;
        self.replace_memo(updated.clone());
        Ok(updated)
    }

    pub async fn delete(&mut self, memo: &Memo) -> StorageResult<()> {
        self.engine.delete_memo(memo).await?;
        self.remove_memo(&memo.id);
        Ok(())
    }

    // -- search --------------------------------------------------------------

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    /// Visible memos matching the query on title or content, ignoring case.
    pub fn filtered_memos(&self) -> Vec<&Memo> {
        let needle = self.query.trim().to_lowercase();
        self.memos
            .iter()
            .filter(|m| m.hidden != Some(true))
            .filter(|m| {
                needle.is_empty()
                    || m.title.to_lowercase().contains(&needle)
                    || m.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    // -- collapsed cards -----------------------------------------------------

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    /// Flip one card and persist the set. Returns the new state.
    pub async fn toggle_collapsed(&mut self, id: &str) -> StorageResult<bool> {
        let collapsed = if self.collapsed.remove(id) {
            false
        } else {
            self.collapsed.insert(id.to_string());
            true
        };
        let ids: Vec<String> = self.collapsed.iter().cloned().collect();
        self.engine.session().save_collapsed_ids(&ids).await?;
        Ok(collapsed)
    }

    // -- draft ---------------------------------------------------------------

    pub async fn restore_draft(&self) -> StorageResult<String> {
        self.engine.session().get_draft().await
    }

    pub async fn clear_draft(&self) -> StorageResult<()> {
        self.engine.session().clear_draft().await
    }

    /// Autosave for the draft: writes the latest text once typing pauses for `idle`.
    pub fn draft_autosave(&self, idle: Duration) -> Coalescer<String> {
        let session = self.engine.session().clone();
        Coalescer::new(idle, move |draft: String| {
            let session = session.clone();
            async move {
                if let Err(e) = session.save_draft(&draft).await {
                    warn!(error = %e, "draft autosave failed");
                }
            }
        })
    }
}
