//! Typed adapters over raw storage areas
//!
//! - `SyncTier`: quota-limited replicated memo list plus settings (Tier A)
//! - `LocalTier`: overflow memo list (Tier B)
//! - `SessionStore`: draft text and collapsed cards for the current session

mod local;
mod session;
mod sync;

pub use local::{LocalTier, LOCAL_MEMOS_KEY};
pub use session::{SessionStore, COLLAPSED_KEY, DRAFT_KEY};
pub use sync::{SyncData, SyncTier, MEMOS_KEY, SETTINGS_KEY};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage_traits::{KvArea, StorageResult};

async fn read_json<T: DeserializeOwned>(area: &dyn KvArea, key: &str) -> StorageResult<Option<T>> {
    match area.get(key).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

async fn write_json<T: Serialize + ?Sized>(
    area: &dyn KvArea,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let json = serde_json::to_string(value)?;
    area.set(key, json).await
}
