//! Input classification for captured text
//!
//! - `text`: title from the first line, markdown detection
//! - `code`: fenced blocks, language detection
//! - `url`: page metadata through a pluggable [`MetadataFetcher`]

mod code;
mod text;
mod url;

use std::sync::LazyLock;

use regex::Regex;

use memo_state::{MemoKind, MemoMetadata, NewMemo};

pub use code::{detect_code_language, is_fenced_block, strip_fences, PLAINTEXT};
pub use text::{has_markdown_patterns, parse_text, truncate, TextParseResult, MAX_TITLE_CHARS};
pub use url::{
    extract_metadata, fallback_metadata, FetchError, HttpMetadataFetcher, MetadataFetcher,
    OfflineFetcher, UrlMetadata,
};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s]+$").expect("valid regex"));

/// Classified input, ready to become a memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// Trimmed input, stored as the memo body
    pub content: String,
    pub kind: MemoKind,
    pub title: String,
    pub metadata: Option<MemoMetadata>,
}

impl ParsedInput {
    /// Creation input stamped with `now` for both timestamps.
    pub fn into_new_memo(self, now: i64) -> NewMemo {
        NewMemo {
            content: self.content,
            title: self.title,
            kind: self.kind,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }
}

pub fn is_url(input: &str) -> bool {
    URL_RE.is_match(input)
}

/// Classify `input` and derive its title and metadata.
pub async fn parse_input(input: &str, fetcher: &dyn MetadataFetcher) -> ParsedInput {
    let trimmed = input.trim();

    if is_url(trimmed) {
        let meta = fetcher.fetch(trimmed).await;
        let title = meta
            .title
            .or_else(|| fallback_metadata(trimmed).title)
            .unwrap_or_else(|| trimmed.to_string());
        return ParsedInput {
            content: trimmed.to_string(),
            kind: MemoKind::Url,
            title,
            metadata: Some(MemoMetadata {
                url: Some(trimmed.to_string()),
                favicon: meta.favicon,
                og_description: meta.og_description,
                ..Default::default()
            }),
        };
    }

    if is_fenced_block(trimmed) {
        let language = detect_code_language(trimmed);
        let first_line = parse_text(&strip_fences(trimmed)).title;
        let title = if first_line.is_empty() {
            language.clone()
        } else {
            first_line
        };
        return ParsedInput {
            content: trimmed.to_string(),
            kind: MemoKind::Code,
            title,
            metadata: Some(MemoMetadata {
                language: Some(language),
                ..Default::default()
            }),
        };
    }

    let parsed = parse_text(trimmed);
    ParsedInput {
        content: trimmed.to_string(),
        kind: MemoKind::Text,
        title: parsed.title,
        metadata: parsed.is_markdown.then(|| MemoMetadata {
            is_markdown: Some(true),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedFetcher(UrlMetadata);

    #[async_trait]
    impl MetadataFetcher for FixedFetcher {
        async fn fetch(&self, _url: &str) -> UrlMetadata {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn url_input_uses_fetched_metadata() {
        let fetcher = FixedFetcher(UrlMetadata {
            title: Some("Example Domain".to_string()),
            favicon: Some("https://example.com/favicon.ico".to_string()),
            og_description: Some("An example".to_string()),
        });
        let parsed = parse_input("  https://example.com/page  ", &fetcher).await;
        assert_eq!(parsed.kind, MemoKind::Url);
        assert_eq!(parsed.title, "Example Domain");
        assert_eq!(parsed.content, "https://example.com/page");
        let meta = parsed.metadata.unwrap();
        assert_eq!(meta.url.as_deref(), Some("https://example.com/page"));
        assert_eq!(meta.og_description.as_deref(), Some("An example"));
    }

    #[tokio::test]
    async fn url_title_falls_back_to_hostname() {
        let fetcher = FixedFetcher(UrlMetadata::default());
        let parsed = parse_input("https://news.example.net/a", &fetcher).await;
        assert_eq!(parsed.title, "news.example.net");
    }

    #[tokio::test]
    async fn urls_with_spaces_are_text() {
        let parsed = parse_input("https://example.com is great", &OfflineFetcher).await;
        assert_eq!(parsed.kind, MemoKind::Text);
    }

    #[tokio::test]
    async fn fenced_block_is_code() {
        let parsed = parse_input("```python\ndef f():\n    pass\n```", &OfflineFetcher).await;
        assert_eq!(parsed.kind, MemoKind::Code);
        assert_eq!(parsed.title, "def f():");
        assert_eq!(parsed.metadata.unwrap().language.as_deref(), Some("python"));
    }

    #[tokio::test]
    async fn markdown_text_is_flagged() {
        let parsed = parse_input("# Todo\n- ship it", &OfflineFetcher).await;
        assert_eq!(parsed.kind, MemoKind::Text);
        assert_eq!(parsed.title, "Todo");
        assert_eq!(parsed.metadata.unwrap().is_markdown, Some(true));

        let plain = parse_input("just words", &OfflineFetcher).await;
        assert_eq!(plain.metadata, None);
    }

    #[test]
    fn into_new_memo_stamps_both_timestamps() {
        let parsed = ParsedInput {
            content: "x".to_string(),
            kind: MemoKind::Text,
            title: "x".to_string(),
            metadata: None,
        };
        let new = parsed.into_new_memo(42);
        assert_eq!((new.created_at, new.updated_at), (42, 42));
        assert!(!new.local_only);
    }
}
