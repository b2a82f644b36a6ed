//! Persisted data model for Memos
//!
//! Records:
//! - `Memo`: the only persisted entity, stored in the synced or the local tier
//! - `UserSettings`: stored next to the synced memo list
//! - `StorageUsage`: byte accounting for a quota-limited area
//!
//! Field names on the wire are camelCase so that exported collections stay
//! readable by the browser side of the extension.

use serde::{Deserialize, Serialize};

/// Memo type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoKind {
    #[default]
    Text,
    Url,
    Code,
}

impl MemoKind {
    /// Every accepted kind, in wire form.
    pub const ALL: [&'static str; 3] = ["text", "url", "code"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoKind::Text => "text",
            MemoKind::Url => "url",
            MemoKind::Code => "code",
        }
    }
}

impl std::fmt::Display for MemoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload attached to a memo
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoMetadata {
    /// Page URL (url memos)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Favicon URL (url memos)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    /// `og:description` of the page (url memos)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    /// Detected language (code memos)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether the body renders as markdown (text memos)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_markdown: Option<bool>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single memo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: String,
    pub content: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MemoKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MemoMetadata>,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
    /// Routing marker: the authoritative copy lives in the local tier.
    #[serde(rename = "_local_only", default, skip_serializing_if = "is_false")]
    pub local_only: bool,
    /// UI soft-delete flag, independent of the storage tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl Memo {
    /// Build a stored memo from creation input and an assigned id.
    pub fn from_new(id: impl Into<String>, new: NewMemo) -> Self {
        Memo {
            id: id.into(),
            content: new.content,
            title: new.title,
            kind: new.kind,
            metadata: new.metadata,
            created_at: new.created_at,
            updated_at: new.updated_at,
            local_only: new.local_only,
            hidden: new.hidden,
        }
    }

    /// Plain field-by-field copy, used before anything is handed to a store.
    pub fn detached(&self) -> Self {
        Memo {
            id: self.id.clone(),
            content: self.content.clone(),
            title: self.title.clone(),
            kind: self.kind,
            metadata: self.metadata.as_ref().map(|m| MemoMetadata {
                url: m.url.clone(),
                favicon: m.favicon.clone(),
                og_description: m.og_description.clone(),
                language: m.language.clone(),
                is_markdown: m.is_markdown,
            }),
            created_at: self.created_at,
            updated_at: self.updated_at,
            local_only: self.local_only,
            hidden: self.hidden,
        }
    }

    /// Tier that owns this memo according to its routing marker.
    pub fn tier(&self) -> StorageTier {
        if self.local_only {
            StorageTier::Local
        } else {
            StorageTier::Sync
        }
    }

    /// The page URL for url memos.
    pub fn url(&self) -> Option<&str> {
        if self.kind != MemoKind::Url {
            return None;
        }
        self.metadata.as_ref().and_then(|m| m.url.as_deref())
    }
}

/// Creation input for a memo: everything except the id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemo {
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: MemoKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MemoMetadata>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(rename = "_local_only", default, skip_serializing_if = "is_false")]
    pub local_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl NewMemo {
    /// Text memo stamped with `now` for both timestamps.
    pub fn text(content: impl Into<String>, title: impl Into<String>, now: i64) -> Self {
        NewMemo {
            content: content.into(),
            title: title.into(),
            kind: MemoKind::Text,
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }
}

/// Storage tier holding the authoritative copy of a memo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    /// Quota-limited, replicated tier (Tier A)
    Sync,
    /// Overflow tier (Tier B)
    Local,
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageTier::Sync => f.write_str("sync"),
            StorageTier::Local => f.write_str("local"),
        }
    }
}

/// Color theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Theme::Auto),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// User settings stored in the synced tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub quick_save_shortcut: String,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            quick_save_shortcut: "Alt+S".to_string(),
            theme: Theme::Auto,
        }
    }
}

/// Byte accounting for a quota-limited area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub bytes_in_use: u64,
    pub quota: u64,
    /// `bytes_in_use / quota`
    pub percentage: f64,
}

impl StorageUsage {
    pub fn new(bytes_in_use: u64, quota: u64) -> Self {
        let percentage = if quota == 0 {
            0.0
        } else {
            bytes_in_use as f64 / quota as f64
        };
        StorageUsage {
            bytes_in_use,
            quota,
            percentage,
        }
    }
}

/// Size in bytes of the UTF-8 JSON encoding of `value`.
pub fn serialized_size<T: Serialize + ?Sized>(value: &T) -> Result<usize, serde_json::Error> {
    Ok(serde_json::to_vec(value)?.len())
}

#[derive(Serialize)]
struct MemoEnvelope<'a> {
    memos: &'a [Memo],
}

/// Size of a memo collection as the synced tier accounts it (`{"memos":[...]}`).
pub fn collection_size(memos: &[Memo]) -> Result<usize, serde_json::Error> {
    serialized_size(&MemoEnvelope { memos })
}
