//! Tiering thresholds for the synced tier.
//!
//! Three separate byte limits guard the same platform quota at different
//! points of the memo lifecycle. They are kept independent so each can be
//! tuned without touching the others.

/// Admission limit for `save_memo`: the projected collection must stay below this.
pub const SYNC_ADMIT_BYTES: usize = 7_500;

/// Re-check limit for `update_memo`: above this the memo moves to the local tier.
pub const SYNC_UPDATE_BYTES: usize = 8_000;

/// Eviction trigger for `migrate_if_needed`.
pub const SYNC_MIGRATE_BYTES: usize = 7_000;

/// Largest single memo the synced tier is offered by `can_fit_in_sync`.
pub const MAX_MEMO_BYTES: usize = 8_192;

/// Synced-tier usage ratio above which `can_fit_in_sync` declines new memos.
pub const SYNC_USAGE_THRESHOLD: f64 = 0.75;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} is not a byte count")]
    InvalidBytes { var: &'static str, value: String },
}

/// Byte thresholds applied to the serialized synced collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub admit_bytes: usize,
    pub update_bytes: usize,
    pub migrate_bytes: usize,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            admit_bytes: SYNC_ADMIT_BYTES,
            update_bytes: SYNC_UPDATE_BYTES,
            migrate_bytes: SYNC_MIGRATE_BYTES,
        }
    }
}

impl TierLimits {
    /// Defaults overridden by environment variables
    ///
    /// Reads:
    /// - MEMOS_SYNC_ADMIT_BYTES (optional, default: 7500)
    /// - MEMOS_SYNC_UPDATE_BYTES (optional, default: 8000)
    /// - MEMOS_SYNC_MIGRATE_BYTES (optional, default: 7000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            admit_bytes: parse_var(&lookup, "MEMOS_SYNC_ADMIT_BYTES", defaults.admit_bytes)?,
            update_bytes: parse_var(&lookup, "MEMOS_SYNC_UPDATE_BYTES", defaults.update_bytes)?,
            migrate_bytes: parse_var(&lookup, "MEMOS_SYNC_MIGRATE_BYTES", defaults.migrate_bytes)?,
        })
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBytes { var, value }),
    }
}
