//! Free-text address list sanitizing.
//!
//! Administrators paste allowlists as plain text, one address or range per
//! line, often annotated with comments. [`parse_address_list`] turns that text
//! into the clean token sequence the allowlist consumes.

use regex::Regex;
use std::sync::LazyLock;

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(//|#).*").unwrap());

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Parse raw multi-line text into address tokens.
///
/// Line comments (`// ...`, `# ...`) are stripped first, then C-style block
/// comments (`/* ... */`, possibly spanning lines). Every remaining line is
/// trimmed and blank lines are dropped. Order and duplicates are preserved;
/// the tokens are not validated as addresses.
#[must_use]
pub fn parse_address_list(raw: &str) -> Vec<String> {
    let without_line_comments = LINE_COMMENT.replace_all(raw.trim(), "");
    let cleaned = BLOCK_COMMENT.replace_all(&without_line_comments, "");

    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
