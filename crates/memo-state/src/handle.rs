//! Store handles - Connection and area wiring
//!
//! Picks the backend for a [`StoreConfig`] and hands out its storage areas
//! and search index.
//!
//! On-disk stores use SQLite (`sqlite://<dir>`). In-memory (`mem://`) and
//! remote endpoints go through SurrealDB's `any` engine.

use std::path::Path;
use std::sync::Arc;

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{info, instrument};

use crate::error::StateError;
use crate::migrations::{self, LOCAL_AREA_TABLE, SYNC_AREA_TABLE};
use crate::sqlite::{SqliteStore, LOCAL_DB_FILE};
use crate::storage_traits::{AreaQuota, KvArea, SearchIndex};
use crate::surreal_index::SurrealSearchIndex;
use crate::surreal_kv::SurrealKvArea;
use crate::Result;

/// Default on-disk location used when nothing is configured.
pub const DEFAULT_DATA_DIR: &str = ".memos/db";

const LOCAL_SCHEME: &str = "sqlite://";

/// Connection settings for the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Endpoint URL (e.g. "mem://", "sqlite://.memos/db", "ws://host:8000")
    pub endpoint: String,
    /// Namespace (default: "memos")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: "memos".to_string(),
            database: "main".to_string(),
        }
    }

    /// Volatile in-memory database
    pub fn in_memory() -> Self {
        Self::new("mem://")
    }

    /// On-disk SQLite database under `dir`
    pub fn local(dir: impl AsRef<Path>) -> Self {
        Self::new(format!("{}{}", LOCAL_SCHEME, dir.as_ref().display()))
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - MEMOS_DB_URL (optional) - explicit endpoint, wins over the data dir
    /// - MEMOS_DATA_DIR (optional, default: ".memos/db")
    /// - MEMOS_DB_NAMESPACE (optional, default: "memos")
    /// - MEMOS_DB_DATABASE (optional, default: "main")
    pub fn from_env() -> Self {
        let base = match std::env::var("MEMOS_DB_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => {
                let dir = std::env::var("MEMOS_DATA_DIR")
                    .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
                Self::local(dir)
            }
        };
        let namespace =
            std::env::var("MEMOS_DB_NAMESPACE").unwrap_or_else(|_| "memos".to_string());
        let database =
            std::env::var("MEMOS_DB_DATABASE").unwrap_or_else(|_| "main".to_string());
        base.with_namespace(namespace).with_database(database)
    }

    /// Directory of an on-disk endpoint, if this is one.
    pub fn local_dir(&self) -> Option<&str> {
        self.endpoint.strip_prefix(LOCAL_SCHEME)
    }
}

/// Backend selected from a [`StoreConfig`]
#[derive(Clone)]
pub enum StoreHandle {
    Sqlite(SqliteStore),
    Surreal(SurrealHandle),
}

impl StoreHandle {
    /// Open the on-disk store for `sqlite://` endpoints, else connect SurrealDB.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        match config.local_dir() {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    StateError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        dir, e
                    ))
                })?;
                let path = Path::new(dir).join(LOCAL_DB_FILE);
                info!(path = %path.display(), "opening on-disk store");
                Ok(StoreHandle::Sqlite(SqliteStore::open(path)?))
            }
            None => Ok(StoreHandle::Surreal(SurrealHandle::connect(config).await?)),
        }
    }

    /// Connect using environment variables (see [`StoreConfig::from_env`])
    pub async fn setup_from_env() -> Result<Self> {
        Self::connect(&StoreConfig::from_env()).await
    }

    pub fn sync_area(&self) -> Arc<dyn KvArea> {
        match self {
            StoreHandle::Sqlite(store) => Arc::new(store.sync_area()),
            StoreHandle::Surreal(handle) => Arc::new(handle.sync_area()),
        }
    }

    pub fn local_area(&self) -> Arc<dyn KvArea> {
        match self {
            StoreHandle::Sqlite(store) => Arc::new(store.local_area()),
            StoreHandle::Surreal(handle) => Arc::new(handle.local_area()),
        }
    }

    pub fn search_index(&self) -> Arc<dyn SearchIndex> {
        match self {
            StoreHandle::Sqlite(store) => Arc::new(store.search_index()),
            StoreHandle::Surreal(handle) => Arc::new(handle.search_index()),
        }
    }
}

/// SurrealDB connection handle for Memos
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

impl SurrealHandle {
    /// Connect, select namespace/database and run migrations
    #[instrument(
        skip(config),
        fields(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database
        )
    )]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let db = surrealdb::engine::any::connect(config.endpoint.as_str())
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        migrations::init_schema(&db).await?;

        info!("SurrealDB connected and schema initialized");
        Ok(SurrealHandle { db })
    }

    /// Connect to SurrealDB in-memory and set up schema
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&StoreConfig::in_memory()).await
    }

    /// Connect using environment variables (see [`StoreConfig::from_env`])
    pub async fn setup_from_env() -> Result<Self> {
        Self::connect(&StoreConfig::from_env()).await
    }

    /// Replicated area (Tier A), with the platform sync quota.
    pub fn sync_area(&self) -> SurrealKvArea {
        SurrealKvArea::new(self.db.clone(), SYNC_AREA_TABLE, "sync", AreaQuota::sync())
    }

    /// Local overflow area (Tier B).
    pub fn local_area(&self) -> SurrealKvArea {
        SurrealKvArea::new(
            self.db.clone(),
            LOCAL_AREA_TABLE,
            "local",
            AreaQuota::local(),
        )
    }

    /// Search index (Tier C).
    pub fn search_index(&self) -> SurrealSearchIndex {
        SurrealSearchIndex::new(self.db.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_round_trips_dir() {
        let config = StoreConfig::local("/tmp/memos-db");
        assert_eq!(config.endpoint, "sqlite:///tmp/memos-db");
        assert_eq!(config.local_dir(), Some("/tmp/memos-db"));
        assert_eq!(config.namespace, "memos");
        assert_eq!(config.database, "main");
        assert_eq!(StoreConfig::in_memory().local_dir(), None);
    }

    #[test]
    fn builder_overrides_namespace_and_database() {
        let config = StoreConfig::in_memory()
            .with_namespace("test")
            .with_database("scratch");
        assert_eq!(config.namespace, "test");
        assert_eq!(config.database, "scratch");
    }

    #[tokio::test]
    async fn test_surreal_connection_and_schema_creation() {
        let handle = SurrealHandle::in_memory().await;
        assert!(handle.is_ok(), "Failed to connect: {:?}", handle.err());
    }

    #[tokio::test]
    async fn test_areas_are_isolated() {
        let handle = SurrealHandle::in_memory().await.unwrap();
        let sync = handle.sync_area();
        let local = handle.local_area();

        sync.set("memos", "[]".to_string()).await.unwrap();
        assert_eq!(sync.get("memos").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(local.get("memos").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_handle_picks_backend() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = StoreHandle::connect(&StoreConfig::local(dir.path().join("db")))
            .await
            .unwrap();
        assert!(matches!(on_disk, StoreHandle::Sqlite(_)));
        assert!(dir.path().join("db").join(LOCAL_DB_FILE).exists());

        let volatile = StoreHandle::connect(&StoreConfig::in_memory())
            .await
            .unwrap();
        assert!(matches!(volatile, StoreHandle::Surreal(_)));
    }

    #[tokio::test]
    async fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::local(dir.path().join("db"));

        {
            let handle = StoreHandle::connect(&config).await.unwrap();
            handle
                .local_area()
                .set("local_memos", "[]".to_string())
                .await
                .unwrap();
        }

        let reopened = StoreHandle::connect(&config).await.unwrap();
        let value = reopened.local_area().get("local_memos").await.unwrap();
        assert_eq!(value.as_deref(), Some("[]"));
    }
}
