//! Slug generation for query strings and deconflicted filenames.

use std::sync::LazyLock;

use regex::Regex;

/// Characters that survive slugging untouched (after lowercasing).
#[allow(clippy::expect_used)]
static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_\s-]").expect("slug character regex is valid") // Static pattern, safe to panic
});

/// Runs of whitespace and hyphens collapse to a single hyphen.
#[allow(clippy::expect_used)]
static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\s]+").expect("slug separator regex is valid") // Static pattern, safe to panic
});

/// Converts text into a filename-safe slug.
///
/// Lowercases, replaces every character outside `[a-z0-9_]`, whitespace and
/// `-` with a hyphen, collapses whitespace/hyphen runs into one hyphen, and
/// trims hyphens from both ends. Dots are punctuation here, so `v1.0`
/// becomes `v1-0`.
///
/// # Examples
///
/// ```
/// use urlmirror_core::mapping::slugify;
///
/// assert_eq!(slugify("a=1&b=Two"), "a-1-b-two");
/// assert_eq!(slugify("x/docs/guide"), "x-docs-guide");
/// assert_eq!(slugify("v1.0"), "v1-0");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let lowered = text.to_lowercase();
    let replaced = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let collapsed = SEPARATOR_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}
