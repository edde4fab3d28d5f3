//! Post-conversion cleanup passes for extracted article text.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = strip_leftover_html(&result);
    result = clean_blank_lines(&result);
    result = normalize_whitespace(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove stray block-level HTML tags that survived the conversion,
/// preserving their inner text. Code fences are left untouched.
fn strip_leftover_html(md: &str) -> String {
    let mut result = String::new();
    let mut in_code_block = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            result.push_str(line);
            result.push('\n');
            continue;
        }

        if in_code_block {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        result.push_str(&strip_html_tags(line));
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Strip HTML tags from a single line, preserving inner text.
fn strip_html_tags(line: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?(?:div|span|section|article|aside|header|footer|figure|figcaption|details|summary)(?:\s[^>]*)?>").expect("valid regex")
    });

    HTML_TAG_RE.replace_all(line, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Clean up excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 3+ newlines into exactly 2 (one blank line).
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_leftover_html_removes_div_tags() {
        let input = "# Title\n\n<div class=\"note\">Important info</div>\n\nMore text";
        let result = strip_leftover_html(input);
        assert!(result.contains("Important info"));
        assert!(!result.contains("<div"));
        assert!(!result.contains("</div>"));
    }

    #[test]
    fn strip_leftover_html_preserves_code_blocks() {
        let input = "# Title\n\n```html\n<div>Preserved</div>\n```\n\nText";
        let result = strip_leftover_html(input);
        assert!(result.contains("<div>Preserved</div>"));
    }

    #[test]
    fn clean_blank_lines_collapses_excess() {
        let input = "Line 1\n\n\n\n\nLine 2";
        assert_eq!(clean_blank_lines(input), "Line 1\n\nLine 2");
    }

    #[test]
    fn normalize_whitespace_trims_trailing() {
        let input = "Line 1   \nLine 2\t\nLine 3";
        assert_eq!(normalize_whitespace(input), "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn full_pipeline_cleans_markdown() {
        let input = "  \n# Title\n\n\n\n<div>Some content</div>\n\nEnd   \n\n";
        let result = run_pipeline(input);

        assert!(!result.contains("\n\n\n"));
        assert!(!result.contains("<div>"));
        assert!(result.contains("Some content"));
        assert!(result.starts_with("# Title"));
        assert!(result.ends_with("End"));
    }
}
