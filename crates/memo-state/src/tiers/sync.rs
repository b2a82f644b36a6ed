use std::sync::Arc;

use tracing::{debug, instrument};

use super::{read_json, write_json};
use crate::schema::{Memo, StorageUsage, UserSettings};
use crate::storage_traits::{KvArea, StorageResult, SYNC_QUOTA_BYTES};

/// Key of the synced memo list.
pub const MEMOS_KEY: &str = "memos";

/// Key of the user settings record.
pub const SETTINGS_KEY: &str = "settings";

/// Everything the synced tier holds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncData {
    pub memos: Vec<Memo>,
    pub settings: UserSettings,
}

/// Tier A: the small replicated area holding the authoritative memo list
/// while it fits.
#[derive(Clone)]
pub struct SyncTier {
    area: Arc<dyn KvArea>,
    quota: u64,
}

impl SyncTier {
    pub fn new(area: Arc<dyn KvArea>) -> Self {
        Self {
            area,
            quota: SYNC_QUOTA_BYTES,
        }
    }

    /// Read memos and settings, defaulting whatever is missing.
    #[instrument(skip(self))]
    pub async fn read(&self) -> StorageResult<SyncData> {
        let memos: Option<Vec<Memo>> = read_json(self.area.as_ref(), MEMOS_KEY).await?;
        let settings: Option<UserSettings> = read_json(self.area.as_ref(), SETTINGS_KEY).await?;
        Ok(SyncData {
            memos: memos.unwrap_or_default(),
            settings: settings.unwrap_or_default(),
        })
    }

    /// Replace the memo list. Fails with a quota error when it does not fit.
    #[instrument(skip(self, memos), fields(count = memos.len()))]
    pub async fn write(&self, memos: &[Memo]) -> StorageResult<()> {
        write_json(self.area.as_ref(), MEMOS_KEY, memos).await?;
        debug!("synced memo list written");
        Ok(())
    }

    pub async fn save_settings(&self, settings: &UserSettings) -> StorageResult<()> {
        write_json(self.area.as_ref(), SETTINGS_KEY, settings).await
    }

    /// Seed an empty memo list and default settings on first install.
    ///
    /// Keys that already exist are left alone. Returns true when anything was written.
    pub async fn install_defaults(&self) -> StorageResult<bool> {
        let mut seeded = false;
        if self.area.get(MEMOS_KEY).await?.is_none() {
            self.write(&[]).await?;
            seeded = true;
        }
        if self.area.get(SETTINGS_KEY).await?.is_none() {
            self.save_settings(&UserSettings::default()).await?;
            seeded = true;
        }
        Ok(seeded)
    }

    /// Current usage against the area quota.
    pub async fn usage(&self) -> StorageResult<StorageUsage> {
        let bytes_in_use = self.area.bytes_in_use().await?;
        Ok(StorageUsage::new(bytes_in_use, self.quota))
    }
}
