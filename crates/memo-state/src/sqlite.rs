//! SQLite-backed storage areas and search index
//!
//! The on-disk backend. One database file holds every area (table
//! `kv_items`, keyed by area and item key) and the search index (table
//! `memo_index`, one JSON-encoded memo per row). Statements are short and
//! run behind a mutex on the caller's task.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, instrument};

use crate::error::{StateError, StorageError};
use crate::schema::Memo;
use crate::storage_traits::{matches_keyword, AreaQuota, KvArea, SearchIndex, StorageResult};
use crate::Result;

/// File name of the database inside the data directory.
pub const LOCAL_DB_FILE: &str = "memos.sqlite3";

/// Shared SQLite connection handing out areas and the index.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and create missing tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StateError::Connection(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::init(conn)
    }

    /// Private in-memory database (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StateError::Connection(format!("Failed to open in-memory db: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        create_tables(&conn).map_err(|e| StateError::SchemaSetup(e.to_string()))?;
        info!("SQLite store opened and schema initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Replicated area (Tier A), with the platform sync quota.
    pub fn sync_area(&self) -> SqliteKvArea {
        SqliteKvArea::new(self.clone(), "sync", AreaQuota::sync())
    }

    /// Local overflow area (Tier B).
    pub fn local_area(&self) -> SqliteKvArea {
        SqliteKvArea::new(self.clone(), "local", AreaQuota::local())
    }

    /// Search index (Tier C).
    pub fn search_index(&self) -> SqliteSearchIndex {
        SqliteSearchIndex {
            store: self.clone(),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::Backend("sqlite connection lock poisoned".to_string()))?;
        f(&mut conn)
    }
}

fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_items (
            area TEXT NOT NULL,
            item_key TEXT NOT NULL,
            payload TEXT NOT NULL,
            PRIMARY KEY (area, item_key)
        );
        CREATE TABLE IF NOT EXISTS memo_index (
            memo_id TEXT PRIMARY KEY,
            memo_type TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            body TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_memo_index_updated_at ON memo_index(updated_at);",
    )
}

fn area_rows(conn: &Connection, area: &str) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT item_key, payload FROM kv_items WHERE area = ?1")?;
    let rows = stmt
        .query_map(params![area], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// SqliteKvArea
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`KvArea`].
#[derive(Clone)]
pub struct SqliteKvArea {
    store: SqliteStore,
    area: String,
    quota: AreaQuota,
}

impl SqliteKvArea {
    pub fn new(store: SqliteStore, area: impl Into<String>, quota: AreaQuota) -> Self {
        Self {
            store,
            area: area.into(),
            quota,
        }
    }
}

#[async_trait]
impl KvArea for SqliteKvArea {
    fn name(&self) -> &str {
        &self.area
    }

    #[instrument(skip(self), fields(area = %self.area))]
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.store.with_conn(|conn| {
            let payload = conn
                .query_row(
                    "SELECT payload FROM kv_items WHERE area = ?1 AND item_key = ?2",
                    params![self.area, key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(payload)
        })
    }

    #[instrument(skip(self, json), fields(area = %self.area, bytes = json.len()))]
    async fn set(&self, key: &str, json: String) -> StorageResult<()> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            let rows = area_rows(&tx, &self.area)?;
            let total: u64 = rows.iter().map(|(k, v)| AreaQuota::item_size(k, v)).sum();
            let previous = rows
                .iter()
                .find(|(k, _)| k == key)
                .map(|(k, v)| AreaQuota::item_size(k, v))
                .unwrap_or(0);
            self.quota.check(&self.area, key, &json, total, previous)?;

            tx.execute(
                "INSERT INTO kv_items (area, item_key, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT (area, item_key) DO UPDATE SET payload = excluded.payload",
                params![self.area, key, json],
            )?;
            tx.commit()?;
            Ok(())
        })?;
        debug!("area item written");
        Ok(())
    }

    #[instrument(skip(self), fields(area = %self.area))]
    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.store.with_conn(|conn| {
            conn.execute(
                "DELETE FROM kv_items WHERE area = ?1 AND item_key = ?2",
                params![self.area, key],
            )?;
            Ok(())
        })
    }

    async fn bytes_in_use(&self) -> StorageResult<u64> {
        self.store.with_conn(|conn| {
            Ok(area_rows(conn, &self.area)?
                .iter()
                .map(|(k, v)| AreaQuota::item_size(k, v))
                .sum())
        })
    }
}

// ---------------------------------------------------------------------------
// SqliteSearchIndex
// ---------------------------------------------------------------------------

const UPSERT_INDEX_ROW: &str = "INSERT INTO memo_index (memo_id, memo_type, updated_at, body)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (memo_id) DO UPDATE SET
        memo_type = excluded.memo_type,
        updated_at = excluded.updated_at,
        body = excluded.body";

fn upsert_row(conn: &Connection, memo: &Memo) -> StorageResult<()> {
    let body = serde_json::to_string(&memo.detached())?;
    conn.execute(
        UPSERT_INDEX_ROW,
        params![memo.id, memo.kind.as_str(), memo.updated_at, body],
    )?;
    Ok(())
}

/// SQLite-backed implementation of [`SearchIndex`].
#[derive(Clone)]
pub struct SqliteSearchIndex {
    store: SqliteStore,
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    #[instrument(skip(self, memos), fields(count = memos.len()))]
    async fn rebuild(&self, memos: &[Memo]) -> StorageResult<()> {
        self.store.with_conn(|conn| {
            // One transaction: a failure leaves the previous content in place.
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM memo_index", [])?;
            for memo in memos {
                upsert_row(&tx, memo)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        info!("Search index rebuilt ({} memos)", memos.len());
        Ok(())
    }

    #[instrument(skip(self, memo), fields(id = %memo.id))]
    async fn put(&self, memo: &Memo) -> StorageResult<()> {
        self.store.with_conn(|conn| upsert_row(conn, memo))?;
        debug!("memo indexed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> StorageResult<()> {
        self.store.with_conn(|conn| {
            conn.execute("DELETE FROM memo_index WHERE memo_id = ?1", params![id])?;
            Ok(())
        })
    }

    #[instrument(skip(self))]
    async fn search(&self, keyword: &str) -> StorageResult<Vec<Memo>> {
        let lowered = keyword.to_lowercase();
        let bodies = self.store.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT body FROM memo_index ORDER BY updated_at ASC, rowid ASC")?;
            let bodies = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(bodies)
        })?;

        let mut hits = Vec::new();
        for body in bodies {
            let memo: Memo = serde_json::from_str(&body)?;
            if matches_keyword(&memo, &lowered) {
                hits.push(memo);
            }
        }
        debug!("search matched {} memos", hits.len());
        Ok(hits)
    }

    async fn is_available(&self) -> bool {
        self.store
            .with_conn(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tables_are_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCAL_DB_FILE);
        SqliteStore::open(&path).unwrap();
        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.search_index().is_available().await);
    }

    #[tokio::test]
    async fn test_areas_share_one_table_without_mixing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .sync_area()
            .set("memos", "[]".to_string())
            .await
            .unwrap();
        assert_eq!(store.local_area().get("memos").await.unwrap(), None);
        assert_eq!(store.sync_area().bytes_in_use().await.unwrap(), 7);
    }
}
