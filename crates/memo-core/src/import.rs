//! Import conflict strategies and structural validation of import payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use memo_state::MemoKind;

/// How to treat an incoming memo whose id already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    /// Drop the incoming memo
    #[default]
    Skip,
    /// Replace the stored memo, keeping the id
    Overwrite,
    /// Store the incoming memo under a fresh id
    Duplicate,
}

impl std::str::FromStr for ImportStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(ImportStrategy::Skip),
            "overwrite" => Ok(ImportStrategy::Overwrite),
            "duplicate" => Ok(ImportStrategy::Duplicate),
            other => Err(format!(
                "unknown import strategy: {other} (expected skip, overwrite or duplicate)"
            )),
        }
    }
}

impl std::fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStrategy::Skip => f.write_str("skip"),
            ImportStrategy::Overwrite => f.write_str("overwrite"),
            ImportStrategy::Duplicate => f.write_str("duplicate"),
        }
    }
}

/// Counts returned by an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Structural check of an import payload.
///
/// Must be an array whose every element has string `id`, `content` and
/// `title`, a known `type`, and numeric `createdAt` / `updatedAt`.
pub fn validate_memo_data(data: &Value) -> bool {
    let Some(items) = data.as_array() else {
        return false;
    };
    items.iter().all(is_memo_shaped)
}

fn is_memo_shaped(item: &Value) -> bool {
    let Some(obj) = item.as_object() else {
        return false;
    };
    let is_str = |field: &str| obj.get(field).is_some_and(Value::is_string);
    let is_num = |field: &str| obj.get(field).is_some_and(Value::is_number);
    let known_type = obj
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| MemoKind::ALL.contains(&t));

    is_str("id")
        && is_str("content")
        && is_str("title")
        && known_type
        && is_num("createdAt")
        && is_num("updatedAt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "abc",
            "content": "hello",
            "title": "hello",
            "type": "code",
            "createdAt": 1,
            "updatedAt": 2
        })
    }

    #[test]
    fn accepts_well_formed_arrays() {
        assert!(validate_memo_data(&json!([])));
        assert!(validate_memo_data(&json!([valid(), valid()])));
    }

    #[test]
    fn rejects_non_arrays() {
        assert!(!validate_memo_data(&valid()));
        assert!(!validate_memo_data(&json!("memos")));
        assert!(!validate_memo_data(&Value::Null));
    }

    #[test]
    fn rejects_non_string_id() {
        let mut item = valid();
        item["id"] = json!(42);
        assert!(!validate_memo_data(&json!([item])));
    }

    #[test]
    fn rejects_unknown_type() {
        let mut item = valid();
        item["type"] = json!("image");
        assert!(!validate_memo_data(&json!([valid(), item])));
    }

    #[test]
    fn rejects_missing_timestamps_and_null_elements() {
        let mut item = valid();
        item.as_object_mut().unwrap().remove("updatedAt");
        assert!(!validate_memo_data(&json!([item])));
        assert!(!validate_memo_data(&json!([null])));

        let mut stringly = valid();
        stringly["createdAt"] = json!("1");
        assert!(!validate_memo_data(&json!([stringly])));
    }

    #[test]
    fn strategy_parses_and_defaults_to_skip() {
        assert_eq!(ImportStrategy::default(), ImportStrategy::Skip);
        assert_eq!(
            "Overwrite".parse::<ImportStrategy>().unwrap(),
            ImportStrategy::Overwrite
        );
        assert_eq!(
            "duplicate".parse::<ImportStrategy>().unwrap(),
            ImportStrategy::Duplicate
        );
        assert!("merge".parse::<ImportStrategy>().is_err());
        assert_eq!(ImportStrategy::Skip.to_string(), "skip");
    }
}
