use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, instrument};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("valid regex"));

static OG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property=["']og:title["'][^>]+content=["']([^"']+)["']"#)
        .expect("valid regex")
});

static OG_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property=["']og:description["'][^>]+content=["']([^"']+)["']"#)
        .expect("valid regex")
});

static FAVICON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["'](?:shortcut )?icon["'][^>]+href=["']([^"']+)["']"#)
        .expect("valid regex")
});

/// Errors raised while fetching page metadata
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.to_string())
    }
}

/// Page details shown on a url memo
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlMetadata {
    pub title: Option<String>,
    pub favicon: Option<String>,
    pub og_description: Option<String>,
}

/// Best-effort source of page metadata. Never fails; falls back instead.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> UrlMetadata;
}

/// Hostname title and origin favicon, derived from the URL alone.
pub fn fallback_metadata(url: &str) -> UrlMetadata {
    match Url::parse(url) {
        Ok(parsed) => UrlMetadata {
            title: parsed.host_str().map(str::to_string),
            favicon: Some(format!("{}/favicon.ico", parsed.origin().ascii_serialization())),
            og_description: None,
        },
        Err(_) => UrlMetadata::default(),
    }
}

/// Pull title, `og:*` tags and favicon out of an HTML page.
///
/// `og:title` wins over `<title>`. Relative favicon links resolve against
/// the page URL; without one the page's `/favicon.ico` is assumed.
pub fn extract_metadata(html: &str, page: &Url) -> UrlMetadata {
    let title = capture(&OG_TITLE_RE, html).or_else(|| capture(&TITLE_RE, html));
    let og_description = capture(&OG_DESCRIPTION_RE, html);
    let favicon = FAVICON_RE
        .captures(html)
        .and_then(|c| page.join(&c[1]).ok())
        .or_else(|| page.join("/favicon.ico").ok())
        .map(|u| u.to_string());

    UrlMetadata {
        title,
        favicon,
        og_description,
    }
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html).map(|c| c[1].trim().to_string())
}

/// Fetches pages over HTTP.
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("memos/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch and parse without falling back.
    #[instrument(skip(self))]
    pub async fn try_fetch(&self, url: &str) -> Result<UrlMetadata, FetchError> {
        let page = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let response = self
            .client
            .get(page.clone())
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let html = response.text().await?;
        Ok(extract_metadata(&html, &page))
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &str) -> UrlMetadata {
        match self.try_fetch(url).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(error = %e, "metadata fetch failed, using fallback");
                fallback_metadata(url)
            }
        }
    }
}

/// Never touches the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

#[async_trait]
impl MetadataFetcher for OfflineFetcher {
    async fn fetch(&self, url: &str) -> UrlMetadata {
        fallback_metadata(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/articles/1").unwrap()
    }

    #[test]
    fn og_title_beats_title_tag() {
        let html = r#"<html><head><title> Plain </title>
            <meta property="og:title" content="Social title">
            <meta property="og:description" content="About the page">
            </head></html>"#;
        let meta = extract_metadata(html, &page());
        assert_eq!(meta.title.as_deref(), Some("Social title"));
        assert_eq!(meta.og_description.as_deref(), Some("About the page"));
    }

    #[test]
    fn title_tag_is_trimmed() {
        let meta = extract_metadata("<TITLE>  Hello  </TITLE>", &page());
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(meta.og_description, None);
    }

    #[test]
    fn favicon_resolves_against_page() {
        let html = r#"<link rel="shortcut icon" href="/static/icon.png">"#;
        let meta = extract_metadata(html, &page());
        assert_eq!(
            meta.favicon.as_deref(),
            Some("https://example.com/static/icon.png")
        );

        let html = r#"<link rel="icon" href="img/fav.svg">"#;
        let meta = extract_metadata(html, &page());
        assert_eq!(
            meta.favicon.as_deref(),
            Some("https://example.com/articles/img/fav.svg")
        );
    }

    #[test]
    fn favicon_defaults_to_root() {
        let meta = extract_metadata("<p>no head</p>", &page());
        assert_eq!(
            meta.favicon.as_deref(),
            Some("https://example.com/favicon.ico")
        );
        assert_eq!(meta.title, None);
    }

    #[test]
    fn fallback_uses_host_and_origin() {
        let meta = fallback_metadata("https://docs.example.org:8443/a/b?q=1");
        assert_eq!(meta.title.as_deref(), Some("docs.example.org"));
        assert_eq!(
            meta.favicon.as_deref(),
            Some("https://docs.example.org:8443/favicon.ico")
        );
        assert_eq!(fallback_metadata("not a url"), UrlMetadata::default());
    }

    #[tokio::test]
    async fn offline_fetcher_never_hits_the_network() {
        let meta = OfflineFetcher.fetch("http://localhost/x").await;
        assert_eq!(meta.title.as_deref(), Some("localhost"));
    }
}
