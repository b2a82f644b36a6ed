//! Tests for the typed tier adapters over storage areas.

use std::sync::Arc;

use memo_state::fakes::{FlakyKvArea, MemoryKvArea};
use memo_state::tiers::{COLLAPSED_KEY, DRAFT_KEY, LOCAL_MEMOS_KEY, MEMOS_KEY, SETTINGS_KEY};
use memo_state::{
    KvArea, LocalTier, Memo, MemoKind, SessionStore, SurrealHandle, SyncTier, Theme, UserSettings,
    SYNC_QUOTA_BYTES,
};

fn memo(id: &str, content: &str) -> Memo {
    Memo {
        id: id.to_string(),
        content: content.to_string(),
        title: content.chars().take(15).collect(),
        kind: MemoKind::Text,
        metadata: None,
        created_at: 1,
        updated_at: 1,
        local_only: false,
        hidden: None,
    }
}

// ===========================================================================
// SyncTier
// ===========================================================================

#[tokio::test]
async fn sync_read_defaults_when_empty() {
    let tier = SyncTier::new(Arc::new(MemoryKvArea::sync()));
    let data = tier.read().await.unwrap();
    assert!(data.memos.is_empty());
    assert_eq!(data.settings, UserSettings::default());
}

#[tokio::test]
async fn sync_install_defaults_seeds_once() {
    let area = Arc::new(MemoryKvArea::sync());
    let tier = SyncTier::new(area.clone());

    assert!(tier.install_defaults().await.unwrap());
    assert_eq!(area.get(MEMOS_KEY).await.unwrap().as_deref(), Some("[]"));
    assert!(area.get(SETTINGS_KEY).await.unwrap().is_some());

    tier.write(&[memo("a", "kept")]).await.unwrap();
    assert!(!tier.install_defaults().await.unwrap());
    assert_eq!(tier.read().await.unwrap().memos.len(), 1);
}

#[tokio::test]
async fn sync_settings_round_trip() {
    let tier = SyncTier::new(Arc::new(MemoryKvArea::sync()));
    let settings = UserSettings {
        quick_save_shortcut: "Ctrl+Shift+M".to_string(),
        theme: Theme::Dark,
    };
    tier.save_settings(&settings).await.unwrap();
    assert_eq!(tier.read().await.unwrap().settings, settings);
}

#[tokio::test]
async fn sync_write_over_item_quota_fails_and_keeps_previous_list() {
    let tier = SyncTier::new(Arc::new(MemoryKvArea::sync()));
    tier.write(&[memo("small", "small")]).await.unwrap();

    let err = tier.write(&[memo("big", &"x".repeat(9_000))])
        .await
        .unwrap_err();
    assert!(err.is_quota());

    let data = tier.read().await.unwrap();
    assert_eq!(data.memos, vec![memo("small", "small")]);
}

#[tokio::test]
async fn sync_usage_reports_against_quota() {
    let tier = SyncTier::new(Arc::new(MemoryKvArea::sync()));
    tier.write(&[]).await.unwrap();
    let usage = tier.usage().await.unwrap();
    assert_eq!(usage.bytes_in_use, (MEMOS_KEY.len() + 2) as u64);
    assert_eq!(usage.quota, SYNC_QUOTA_BYTES);
    assert!(usage.percentage > 0.0 && usage.percentage < 0.001);
}

// ===========================================================================
// LocalTier
// ===========================================================================

#[tokio::test]
async fn local_add_upserts_by_id() {
    let tier = LocalTier::new(Arc::new(MemoryKvArea::local()));
    tier.add(&memo("a", "first")).await.unwrap();
    tier.add(&memo("b", "second")).await.unwrap();
    tier.add(&memo("a", "replaced")).await.unwrap();

    let memos = tier.read().await.unwrap();
    assert_eq!(memos.len(), 2);
    assert_eq!(memos[0].id, "a");
    assert_eq!(memos[0].content, "replaced");
    assert_eq!(memos[1].id, "b");
}

#[tokio::test]
async fn local_delete_missing_does_not_write() {
    let area = Arc::new(FlakyKvArea::new(Arc::new(MemoryKvArea::local())));
    let tier = LocalTier::new(area.clone());
    tier.add(&memo("a", "only")).await.unwrap();
    assert_eq!(area.write_count(), 1);

    tier.delete("nope").await.unwrap();
    assert_eq!(area.write_count(), 1);

    tier.delete("a").await.unwrap();
    assert_eq!(area.write_count(), 2);
    assert!(tier.read().await.unwrap().is_empty());
}

#[tokio::test]
async fn local_tier_uses_its_own_key() {
    let area = Arc::new(MemoryKvArea::local());
    let tier = LocalTier::new(area.clone());
    tier.write(&[memo("a", "x")]).await.unwrap();
    assert!(area.get(LOCAL_MEMOS_KEY).await.unwrap().is_some());
    assert!(area.get(MEMOS_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn local_tier_persists_through_surreal() {
    let handle = SurrealHandle::in_memory().await.unwrap();
    let tier = LocalTier::new(Arc::new(handle.local_area()));
    tier.add(&memo("a", "durable")).await.unwrap();

    let reread = LocalTier::new(Arc::new(handle.local_area()));
    assert_eq!(reread.read().await.unwrap(), vec![memo("a", "durable")]);
}

// ===========================================================================
// SessionStore
// ===========================================================================

#[tokio::test]
async fn session_draft_lifecycle() {
    let area = Arc::new(MemoryKvArea::session());
    let session = SessionStore::new(area.clone());

    assert_eq!(session.get_draft().await.unwrap(), "");
    assert!(!session.has_draft().await.unwrap());

    session.save_draft("   \n").await.unwrap();
    assert!(!session.has_draft().await.unwrap());

    session.save_draft("half a thought").await.unwrap();
    assert!(session.has_draft().await.unwrap());
    assert_eq!(session.get_draft().await.unwrap(), "half a thought");

    session.clear_draft().await.unwrap();
    assert!(area.get(DRAFT_KEY).await.unwrap().is_none());
    assert_eq!(session.get_draft().await.unwrap(), "");
}

#[tokio::test]
async fn session_collapsed_ids_round_trip() {
    let area = Arc::new(MemoryKvArea::session());
    let session = SessionStore::new(area.clone());

    assert!(session.get_collapsed_ids().await.unwrap().is_empty());

    let ids = vec!["a".to_string(), "b".to_string()];
    session.save_collapsed_ids(&ids).await.unwrap();
    assert_eq!(session.get_collapsed_ids().await.unwrap(), ids);
    assert_eq!(
        area.get(COLLAPSED_KEY).await.unwrap().as_deref(),
        Some(r#"["a","b"]"#)
    );
}
