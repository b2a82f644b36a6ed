use std::sync::LazyLock;

use regex::Regex;

/// Language reported when no pattern matches.
pub const PLAINTEXT: &str = "plaintext";

static FENCE_LANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(\w+)").expect("valid regex"));

static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```\w*\n?").expect("valid regex"));

static FENCE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n?```$").expect("valid regex"));

/// Scoring table. Order matters: ties go to the earlier language.
const LANGUAGE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "javascript",
        &[
            r"\bconst\b",
            r"\blet\b",
            r"\bfunction\b",
            r"=>\s*\{",
            r"console\.log",
        ],
    ),
    (
        "typescript",
        &[
            r":\s*(string|number|boolean|any)\b",
            r"interface\s+\w+",
            r"<\w+>",
        ],
    ),
    (
        "python",
        &[
            r"\bdef\s+\w+",
            r"\bimport\s+\w+",
            r"\bprint\(",
            r"(?m):\s*$",
        ],
    ),
    (
        "rust",
        &[
            r"\bfn\s+\w+",
            r"\blet\s+mut\b",
            r"\bimpl\b",
            r"->",
            r"::",
            r"&str",
        ],
    ),
    (
        "go",
        &[
            r"\bfunc\s+\w+",
            r"\bpackage\s+\w+",
            r#"\bimport\s+""#,
            r":=",
            r"\bgo\s+\w+",
        ],
    ),
    (
        "java",
        &[
            r"\bpublic\s+class\b",
            r"\bprivate\b",
            r"\bvoid\b",
            r"System\.out",
        ],
    ),
    ("html", &[r"(?i)</?[a-z]+[^>]*>", r"(?i)<!DOCTYPE"]),
    ("css", &[r"\{[^}]*:[^}]*\}", r"@media", r"\.[\w-]+\s*\{"]),
    (
        "sql",
        &[
            r"(?i)\bSELECT\b",
            r"(?i)\bFROM\b",
            r"(?i)\bWHERE\b",
            r"(?i)\bINSERT\b",
        ],
    ),
    (
        "json",
        &[
            r"^\s*\{[\s\S]*\}\s*$",
            r"^\s*\[[\s\S]*\]\s*$",
            r#""[^"]+"\s*:"#,
        ],
    ),
];

static LANGUAGES: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    LANGUAGE_PATTERNS
        .iter()
        .map(|(lang, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect();
            (*lang, compiled)
        })
        .collect()
});

/// Guess the language of a snippet.
///
/// An explicit fence language (` ```rust `) wins. Otherwise every language
/// scores one point per matching pattern and the best score is returned.
pub fn detect_code_language(content: &str) -> String {
    if let Some(caps) = FENCE_LANG_RE.captures(content) {
        return caps[1].to_lowercase();
    }

    let code = strip_fences(content);
    let mut best = (PLAINTEXT, 0usize);
    for (lang, patterns) in LANGUAGES.iter() {
        let score = patterns.iter().filter(|re| re.is_match(&code)).count();
        if score > best.1 {
            best = (lang, score);
        }
    }
    best.0.to_string()
}

/// Body of a fenced block without the opening and closing fence lines.
pub fn strip_fences(content: &str) -> String {
    let opened = FENCE_OPEN_RE.replace(content, "");
    FENCE_CLOSE_RE.replace(&opened, "").into_owned()
}

/// True when the input is a fenced code block.
pub fn is_fenced_block(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```")
}
