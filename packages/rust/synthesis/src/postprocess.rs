//! Deterministic post-processing for generated paragraphs.
//!
//! Backends tend to decorate output with horizontal rules, break Markdown
//! links across lines, and pad with blank lines. The pass below normalizes
//! all of that and is idempotent: applying it twice yields the same text
//! as applying it once.

use std::sync::LazyLock;

use regex::Regex;

/// Phrase that marks a backend echoing a prior failure message as if it
/// were valid output. Matched case-insensitively.
pub const REJECTION_PHRASE: &str = "could not be generated";

/// Normalize a raw completion into a single clean paragraph.
pub fn postprocess(text: &str) -> String {
    static HR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{3,}").expect("valid regex"));
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\s*\(([^)]+)\)").expect("valid regex"));
    static NEWLINE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

    let result = HR_RE.replace_all(text, "");
    let result = LINK_RE.replace_all(&result, "[$1]($2)");
    let result = NEWLINE_RE.replace_all(&result, "\n");

    result.trim().to_string()
}

/// Whether a post-processed result is usable: non-empty and not a
/// failure-message echo.
pub fn is_acceptable(text: &str) -> bool {
    !text.is_empty() && !text.to_lowercase().contains(REJECTION_PHRASE)
}
