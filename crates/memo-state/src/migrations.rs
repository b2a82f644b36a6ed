//! SurrealDB schema migrations and initialization
//!
//! Sets up the tables backing the storage areas and the search index.
//! Every statement is `IF NOT EXISTS`, so running it against an existing
//! on-disk database is a no-op.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Table backing the replicated area.
pub const SYNC_AREA_TABLE: &str = "sync_area";

/// Table backing the local overflow area.
pub const LOCAL_AREA_TABLE: &str = "local_area";

/// Table backing the search index.
pub const MEMO_INDEX_TABLE: &str = "memo_index";

/// Initialize all Memos tables in SurrealDB
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Memos SurrealDB schema");

    init_area_tables(db).await?;
    init_memo_index_table(db).await?;

    info!("Memos schema initialization complete");
    Ok(())
}

/// Initialize the key/value area tables
///
/// Schema:
/// ```text
/// TABLE sync_area | local_area {
///   id:    RECORD (the storage key)
///   item_key:  STRING
///   payload:   STRING (serialized value, counted against the area quota)
/// }
/// ```
async fn init_area_tables(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing area tables");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS sync_area SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS local_area SCHEMALESS;
    "#;

    db.query(sql)
        .await?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("✓ area tables initialized");
    Ok(())
}

/// Initialize `memo_index` table with secondary indexes
///
/// Schema:
/// ```text
/// TABLE memo_index {
///   id:          RECORD (memo id)
///   memo_id:     STRING
///   content:     STRING
///   title:       STRING
///   memo_type:   STRING (text | url | code, indexed)
///   metadata:    OBJECT?
///   created_at:  INT
///   updated_at:  INT (indexed)
///   local_only:  BOOL
///   hidden:      BOOL?
/// }
/// ```
async fn init_memo_index_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing memo_index table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS memo_index SCHEMALESS;

        -- Secondary lookups: recency and type
        DEFINE INDEX IF NOT EXISTS idx_memo_updated_at ON TABLE memo_index COLUMNS updated_at;
        DEFINE INDEX IF NOT EXISTS idx_memo_type ON TABLE memo_index COLUMNS memo_type;
    "#;

    db.query(sql)
        .await?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("✓ memo_index table initialized");
    Ok(())
}
