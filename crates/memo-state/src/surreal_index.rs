//! SurrealDB-backed SearchIndex implementation
//!
//! Uses a private row type for persistence, converting to/from `Memo` at the
//! boundary. The record id of every row is the memo id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::migrations::MEMO_INDEX_TABLE;
use crate::schema::{Memo, MemoKind, MemoMetadata};
use crate::storage_traits::{matches_keyword, SearchIndex, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRow {
    memo_id: String,
    content: String,
    title: String,
    memo_type: MemoKind,
    metadata: Option<MemoMetadata>,
    created_at: i64,
    updated_at: i64,
    local_only: bool,
    hidden: Option<bool>,
}

impl From<&Memo> for IndexRow {
    fn from(memo: &Memo) -> Self {
        let memo = memo.detached();
        IndexRow {
            memo_id: memo.id,
            content: memo.content,
            title: memo.title,
            memo_type: memo.kind,
            metadata: memo.metadata,
            created_at: memo.created_at,
            updated_at: memo.updated_at,
            local_only: memo.local_only,
            hidden: memo.hidden,
        }
    }
}

impl From<IndexRow> for Memo {
    fn from(row: IndexRow) -> Self {
        Memo {
            id: row.memo_id,
            content: row.content,
            title: row.title,
            kind: row.memo_type,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
            local_only: row.local_only,
            hidden: row.hidden,
        }
    }
}

/// SurrealDB-backed implementation of [`SearchIndex`].
#[derive(Clone)]
pub struct SurrealSearchIndex {
    db: Surreal<Any>,
}

impl SurrealSearchIndex {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    async fn all_by_recency(&self) -> StorageResult<Vec<Memo>> {
        let mut res = self
            .db
            .query(
                "SELECT memo_id, content, title, memo_type, metadata, created_at, updated_at, \
                 local_only, hidden FROM type::table($tb) ORDER BY updated_at ASC",
            )
            .bind(("tb", MEMO_INDEX_TABLE))
            .await?;
        let rows: Vec<IndexRow> = res.take(0)?;
        Ok(rows.into_iter().map(Memo::from).collect())
    }
}

#[async_trait]
impl SearchIndex for SurrealSearchIndex {
    #[instrument(skip(self, memos), fields(count = memos.len()))]
    async fn rebuild(&self, memos: &[Memo]) -> StorageResult<()> {
        let rows: Vec<IndexRow> = memos.iter().map(IndexRow::from).collect();

        // One transaction: a failure leaves the previous content in place.
        self.db
            .query(
                r#"
                BEGIN TRANSACTION;
                DELETE type::table($tb);
                FOR $row IN $rows {
                    UPSERT type::thing($tb, $row.memo_id) CONTENT $row;
                };
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("tb", MEMO_INDEX_TABLE))
            .bind(("rows", rows))
            .await?
            .check()?;

        info!("Search index rebuilt ({} memos)", memos.len());
        Ok(())
    }

    #[instrument(skip(self, memo), fields(id = %memo.id))]
    async fn put(&self, memo: &Memo) -> StorageResult<()> {
        let row = IndexRow::from(memo);
        self.db
            .query("UPSERT type::thing($tb, $id) CONTENT $row")
            .bind(("tb", MEMO_INDEX_TABLE))
            .bind(("id", memo.id.clone()))
            .bind(("row", row))
            .await?
            .check()?;
        debug!("memo indexed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> StorageResult<()> {
        self.db
            .query("DELETE type::thing($tb, $id)")
            .bind(("tb", MEMO_INDEX_TABLE))
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn search(&self, keyword: &str) -> StorageResult<Vec<Memo>> {
        let lowered = keyword.to_lowercase();
        let hits: Vec<Memo> = self
            .all_by_recency()
            .await?
            .into_iter()
            .filter(|m| matches_keyword(m, &lowered))
            .collect();
        debug!("search matched {} memos", hits.len());
        Ok(hits)
    }

    async fn is_available(&self) -> bool {
        self.db.health().await.is_ok()
    }
}
