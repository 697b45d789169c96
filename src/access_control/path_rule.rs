//! Path pattern matching.

use super::context::normalize_path;

/// Host-supplied path matching.
///
/// Implementations must be a pure function of `(path, pattern)`.
pub trait PathMatcher: Send + Sync {
    /// Check whether `path` matches `pattern`.
    fn matches(&self, path: &str, pattern: &str) -> bool;

    /// Check whether `path` matches any of `patterns`. Empty lists never match.
    fn matches_any(&self, path: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| self.matches(path, pattern))
    }
}

/// Glob matcher over whole paths.
///
/// `*` matches any run of characters (including `/`), and the literal
/// `<front>` stands for the site front page. Patterns are normalized like
/// request paths: lower-cased, with exactly one leading `/`.
#[derive(Debug, Clone)]
pub struct GlobPathMatcher {
    front_path: String,
}

impl GlobPathMatcher {
    /// Create a matcher with `/` as the front page.
    #[must_use]
    pub fn new() -> Self {
        Self::with_front_path("/")
    }

    /// Create a matcher with a custom front page path.
    #[must_use]
    pub fn with_front_path(front_path: impl AsRef<str>) -> Self {
        Self {
            front_path: normalize_path(front_path.as_ref()),
        }
    }

    /// The front page `<front>` stands for.
    #[must_use]
    pub fn front_path(&self) -> &str {
        &self.front_path
    }
}

impl Default for GlobPathMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PathMatcher for GlobPathMatcher {
    fn matches(&self, path: &str, pattern: &str) -> bool {
        let pattern = pattern.trim();
        if pattern.eq_ignore_ascii_case("<front>") {
            return path == self.front_path;
        }
        glob_match(path, &normalize_path(pattern))
    }
}

/// Parse raw multi-line text into path patterns.
///
/// One pattern per line. Lines are trimmed, and blank lines and lines
/// starting with `#` are dropped. Nothing else is stripped, so `/*` and `//`
/// inside patterns survive.
#[must_use]
pub fn parse_path_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Match `path` against a pattern whose only metacharacter is `*`.
fn glob_match(path: &str, pattern: &str) -> bool {
    let mut pieces: Vec<&str> = pattern.split('*').collect();
    if pieces.len() == 1 {
        return path == pattern;
    }

    let last = pieces.pop().unwrap_or_default();
    let first = pieces.remove(0);

    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    // Leftmost placement of each middle piece leaves the most room for the rest.
    for piece in pieces {
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
