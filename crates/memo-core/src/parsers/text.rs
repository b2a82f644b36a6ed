use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// Longest title kept before the ellipsis.
pub const MAX_TITLE_CHARS: usize = 15;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s+(.+)$").expect("valid regex"));

static MARKDOWN_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        // headings
        r"(?m)^#+\s",
        // bold
        r"\*\*[^*]+\*\*",
        // italic
        r"\*[^*]+\*",
        // links
        r"\[[^\]]+\]\([^)]+\)",
        // unordered lists
        r"(?m)^[-*]\s",
        // ordered lists
        r"(?m)^\d+\.\s",
        // code fences
        r"(?m)^```",
        // inline code
        r"`[^`]+`",
    ])
    .expect("valid regex set")
});

/// Title and markdown flag derived from free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextParseResult {
    pub title: String,
    pub is_markdown: bool,
}

/// Derive a title from the first non-blank line.
///
/// A markdown heading on that line becomes the title and marks the text as
/// markdown; otherwise markdown is detected from the whole body.
pub fn parse_text(content: &str) -> TextParseResult {
    let first_line = content
        .split('\n')
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if let Some(caps) = HEADING_RE.captures(first_line) {
        return TextParseResult {
            title: truncate(&caps[1], MAX_TITLE_CHARS),
            is_markdown: true,
        };
    }

    TextParseResult {
        title: truncate(first_line, MAX_TITLE_CHARS),
        is_markdown: has_markdown_patterns(content),
    }
}

pub fn has_markdown_patterns(content: &str) -> bool {
    MARKDOWN_SET.is_match(content)
}

/// Trim, then cut to `max_chars` characters plus `...` when longer.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_first_line_is_the_title() {
        let parsed = parse_text("Buy milk\nand eggs");
        assert_eq!(parsed.title, "Buy milk");
        assert!(!parsed.is_markdown);
    }

    #[test]
    fn long_titles_are_truncated() {
        let parsed = parse_text("This is a very long first line of text");
        assert_eq!(parsed.title, "This is a very ...");
    }

    #[test]
    fn blank_leading_lines_are_skipped() {
        assert_eq!(parse_text("\n   \n  Second  \nthird").title, "Second");
        assert_eq!(parse_text("").title, "");
    }

    #[test]
    fn heading_becomes_title() {
        let parsed = parse_text("## Meeting notes\n- item");
        assert_eq!(parsed.title, "Meeting notes");
        assert!(parsed.is_markdown);
    }

    #[test]
    fn detects_markdown_in_body() {
        assert!(parse_text("plain\n**bold** text").is_markdown);
        assert!(parse_text("see [docs](https://example.com)").is_markdown);
        assert!(parse_text("list\n- one\n- two").is_markdown);
        assert!(parse_text("steps\n1. first").is_markdown);
        assert!(parse_text("run `cargo fmt`").is_markdown);
        assert!(!parse_text("just some words").is_markdown);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(
            truncate("日本語のテキストをここに書きます。長い", 15),
            "日本語のテキストをここに書きま..."
        );
        assert_eq!(truncate("  padded  ", 15), "padded");
    }
}
