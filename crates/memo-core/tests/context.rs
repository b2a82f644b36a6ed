//! AppContext: list state, capture routing, search, collapsed cards and
//! draft autosave.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{new_text, stored, Harness};
use memo_core::{AppContext, MemoKind, OfflineFetcher};

fn context(h: &Harness) -> AppContext {
    AppContext::new(h.engine.clone(), Arc::new(OfflineFetcher))
}

#[tokio::test]
async fn load_populates_the_merged_view() {
    let h = Harness::new();
    h.sync_tier()
        .write(&[stored("a", "alpha", 1)])
        .await
        .unwrap();
    h.local_tier()
        .write(&[stored("b", "beta", 2)])
        .await
        .unwrap();

    let mut ctx = context(&h);
    assert!(ctx.is_loading());
    ctx.load().await.unwrap();

    assert!(!ctx.is_loading());
    let ids: Vec<&str> = ctx.memos().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn load_failure_clears_the_loading_flag() {
    let h = Harness::new();
    h.sync.fail_reads(true);
    let mut ctx = context(&h);

    assert!(ctx.load().await.is_err());
    assert!(!ctx.is_loading());
}

#[tokio::test]
async fn capture_classifies_and_prepends() {
    let h = Harness::new();
    let mut ctx = context(&h);
    ctx.load().await.unwrap();

    let text = ctx.capture("  remember the milk  ").await.unwrap().unwrap();
    assert_eq!(text.kind, MemoKind::Text);
    assert_eq!(text.content, "remember the milk");

    let url = ctx
        .capture("https://example.com/page")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(url.kind, MemoKind::Url);
    assert_eq!(url.url(), Some("https://example.com/page"));

    let code = ctx
        .capture("```\nfn main() {\n    let mut v = Vec::new();\n}\n```")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code.kind, MemoKind::Code);
    assert_eq!(
        code.metadata.as_ref().and_then(|m| m.language.as_deref()),
        Some("rust")
    );

    let ids: Vec<&str> = ctx.memos().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![code.id.as_str(), url.id.as_str(), text.id.as_str()]
    );
    assert_eq!(h.engine.get_all_memos().await.unwrap().len(), 3);
}

#[tokio::test]
async fn blank_capture_stores_nothing() {
    let h = Harness::new();
    let mut ctx = context(&h);
    assert_eq!(ctx.capture("   \n\t").await.unwrap(), None);
    assert!(ctx.memos().is_empty());
    assert!(h.engine.get_all_memos().await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_and_delete_keep_list_in_step() {
    let h = Harness::new();
    let mut ctx = context(&h);
    let first = ctx.capture("first").await.unwrap().unwrap();
    let second = ctx.capture("second").await.unwrap().unwrap();
    assert_eq!(ctx.memos()[0].id, second.id);

    let mut changed = first.clone();
    changed.content = "first, edited".to_string();
    let edited = ctx.edit(&changed).await.unwrap();
    assert_eq!(ctx.memos()[0].id, first.id);
    assert_eq!(ctx.memos()[0].content, "first, edited");
    assert!(edited.updated_at > first.updated_at);

    ctx.delete(&second).await.unwrap();
    assert_eq!(ctx.memos().len(), 1);
    assert_eq!(h.engine.get_all_memos().await.unwrap().len(), 1);
}

#[tokio::test]
async fn filter_matches_title_or_content_and_skips_hidden() {
    let h = Harness::new();
    let mut hidden = stored("h", "Grocery list", 3);
    hidden.hidden = Some(true);
    h.sync_tier()
        .write(&[stored("a", "Grocery run", 1), stored("b", "Meeting notes", 2), hidden])
        .await
        .unwrap();
    let mut ctx = context(&h);
    ctx.load().await.unwrap();

    assert_eq!(ctx.filtered_memos().len(), 2);

    ctx.set_query("GROCERY");
    let hits: Vec<&str> = ctx
        .filtered_memos()
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(hits, vec!["a"]);
    assert_eq!(ctx.query(), "GROCERY");

    ctx.clear_query();
    assert_eq!(ctx.filtered_memos().len(), 2);
}

#[tokio::test]
async fn collapsed_cards_survive_a_reload() {
    let h = Harness::new();
    let mut ctx = context(&h);
    ctx.load().await.unwrap();

    assert!(ctx.toggle_collapsed("a").await.unwrap());
    assert!(ctx.toggle_collapsed("b").await.unwrap());
    assert!(!ctx.toggle_collapsed("a").await.unwrap());

    let mut fresh = context(&h);
    fresh.load().await.unwrap();
    assert!(!fresh.is_collapsed("a"));
    assert!(fresh.is_collapsed("b"));
}

#[tokio::test]
async fn reload_picks_up_external_writes() {
    let h = Harness::new();
    let mut ctx = context(&h);
    ctx.load().await.unwrap();

    h.engine
        .save_memo(new_text("from another window"))
        .await
        .unwrap();
    assert!(ctx.memos().is_empty());
    ctx.reload().await.unwrap();
    assert_eq!(ctx.memos().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn draft_autosave_writes_latest_text_after_idle() {
    let h = Harness::new();
    let ctx = context(&h);
    let autosave = ctx.draft_autosave(Duration::from_millis(500));

    autosave.push("h".to_string());
    autosave.push("he".to_string());
    autosave.push("hello".to_string());
    assert_eq!(ctx.restore_draft().await.unwrap(), "");

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(ctx.restore_draft().await.unwrap(), "hello");

    autosave.push("hello world".to_string());
    autosave.close().await;
    assert_eq!(ctx.restore_draft().await.unwrap(), "hello world");

    ctx.clear_draft().await.unwrap();
    assert_eq!(ctx.restore_draft().await.unwrap(), "");
}
