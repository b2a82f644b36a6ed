//! Memo-State: Storage tiers for Memos
//!
//! This crate provides the persistence layer for the Memos sidebar. It owns
//! the storage areas, their quota accounting and the derived search index.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: byte-exact quota accounting, typed tier adapters and a rebuildable
//! search cache.
//!
//! ## Key Components
//!
//! - `KvArea`: one key/value storage area (synced, local or session)
//! - `SyncTier` / `LocalTier` / `SessionStore`: typed views over the areas
//! - `SearchIndex`: derived full-text cache over every memo
//! - `StoreHandle`: picks SQLite (on disk) or SurrealDB (`mem://`, remote)
//!   and hands out the areas and index

mod error;
pub mod fakes;
mod handle;
pub mod migrations;
mod schema;
pub mod sqlite;
pub mod storage_traits;
pub mod surreal_index;
pub mod surreal_kv;
pub mod tiers;

pub use error::{StateError, StorageError};
pub use handle::{StoreConfig, StoreHandle, SurrealHandle, DEFAULT_DATA_DIR};
pub use schema::{
    collection_size, serialized_size, Memo, MemoKind, MemoMetadata, NewMemo, StorageTier,
    StorageUsage, Theme, UserSettings,
};
pub use sqlite::{SqliteKvArea, SqliteSearchIndex, SqliteStore, LOCAL_DB_FILE};
pub use storage_traits::{
    AreaQuota, KvArea, SearchIndex, StorageResult, LOCAL_QUOTA_BYTES, SYNC_QUOTA_BYTES,
    SYNC_QUOTA_BYTES_PER_ITEM,
};
pub use surreal_index::SurrealSearchIndex;
pub use surreal_kv::SurrealKvArea;
pub use tiers::{LocalTier, SessionStore, SyncData, SyncTier};

/// Result type for memo-state operations
pub type Result<T> = std::result::Result<T, StateError>;
