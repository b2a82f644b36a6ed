//! Memo-Core: tiering engine for Memos
//!
//! Decides which storage tier owns each memo, merges the tiers into one
//! view, and keeps the search index in step.
//!
//! ## Key Components
//!
//! - `StorageEngine`: save / update / delete / import across the tiers
//! - `TierLimits`: byte thresholds guarding the synced tier
//! - `parsers`: classify captured input as text, url or code
//! - `AppContext`: explicit application state for a UI host
//! - `Coalescer`: idle-timer coalescing for draft autosave

pub mod coalesce;
pub mod config;
pub mod context;
pub mod engine;
pub mod ids;
pub mod import;
pub mod metrics;
pub mod obs;
pub mod parsers;
pub mod telemetry;

pub use coalesce::Coalescer;
pub use config::{
    ConfigError, TierLimits, MAX_MEMO_BYTES, SYNC_ADMIT_BYTES, SYNC_MIGRATE_BYTES,
    SYNC_UPDATE_BYTES, SYNC_USAGE_THRESHOLD,
};
pub use context::AppContext;
pub use engine::{MigrationOutcome, StorageEngine};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use import::{validate_memo_data, ImportStrategy, ImportSummary};
pub use metrics::METRICS;
pub use obs::{
    emit_cache_error, emit_import_finished, emit_memo_saved, emit_migrated,
    emit_migration_failed, emit_tier_fallback,
};
pub use parsers::{parse_input, HttpMetadataFetcher, MetadataFetcher, OfflineFetcher};
pub use telemetry::init_tracing;

pub use memo_state::{
    Memo, MemoKind, MemoMetadata, NewMemo, StorageError, StorageResult, StorageTier,
    StorageUsage, Theme, UserSettings,
};
