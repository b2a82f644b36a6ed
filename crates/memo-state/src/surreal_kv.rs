//! SurrealDB-backed KvArea implementation
//!
//! Each area is one table; every key is one record whose id is the key.
//! Values are stored as JSON text so byte accounting matches the platform rule.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, instrument};

use crate::storage_traits::{AreaQuota, KvArea, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KvRow {
    item_key: String,
    payload: String,
}

/// SurrealDB-backed implementation of [`KvArea`].
#[derive(Clone)]
pub struct SurrealKvArea {
    db: Surreal<Any>,
    table: String,
    name: String,
    quota: AreaQuota,
}

impl SurrealKvArea {
    pub fn new(
        db: Surreal<Any>,
        table: impl Into<String>,
        name: impl Into<String>,
        quota: AreaQuota,
    ) -> Self {
        Self {
            db,
            table: table.into(),
            name: name.into(),
            quota,
        }
    }

    // -- private helpers -----------------------------------------------------

    async fn rows(&self) -> StorageResult<Vec<KvRow>> {
        let mut res = self
            .db
            .query("SELECT item_key, payload FROM type::table($tb)")
            .bind(("tb", self.table.clone()))
            .await?;
        let rows: Vec<KvRow> = res.take(0)?;
        Ok(rows)
    }
}

#[async_trait]
impl KvArea for SurrealKvArea {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(area = %self.name))]
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut res = self
            .db
            .query("SELECT item_key, payload FROM type::thing($tb, $key)")
            .bind(("tb", self.table.clone()))
            .bind(("key", key.to_string()))
            .await?;
        let rows: Vec<KvRow> = res.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.payload))
    }

    #[instrument(skip(self, json), fields(area = %self.name, bytes = json.len()))]
    async fn set(&self, key: &str, json: String) -> StorageResult<()> {
        let rows = self.rows().await?;
        let total: u64 = rows
            .iter()
            .map(|r| AreaQuota::item_size(&r.item_key, &r.payload))
            .sum();
        let previous = rows
            .iter()
            .find(|r| r.item_key == key)
            .map(|r| AreaQuota::item_size(&r.item_key, &r.payload))
            .unwrap_or(0);
        self.quota.check(&self.name, key, &json, total, previous)?;

        self.db
            .query("UPSERT type::thing($tb, $key) CONTENT { item_key: $key, payload: $json }")
            .bind(("tb", self.table.clone()))
            .bind(("key", key.to_string()))
            .bind(("json", json))
            .await?
            .check()?;
        debug!("area item written");
        Ok(())
    }

    #[instrument(skip(self), fields(area = %self.name))]
    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.db
            .query("DELETE type::thing($tb, $key)")
            .bind(("tb", self.table.clone()))
            .bind(("key", key.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    async fn bytes_in_use(&self) -> StorageResult<u64> {
        Ok(self
            .rows()
            .await?
            .iter()
            .map(|r| AreaQuota::item_size(&r.item_key, &r.payload))
            .sum())
    }
}
