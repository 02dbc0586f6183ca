//! Jira issue key detection in pull request titles and branch names.

use regex::Regex;
use std::sync::LazyLock;

/// Project key (uppercase letter, then at least one uppercase letter or digit),
/// a dash, and the issue number.
static JIRA_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][A-Z0-9]+-\d+").expect("Jira key pattern is valid"));

/// Same pattern, anchored: the whole input must be a key.
static EXACT_JIRA_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]+-\d+$").expect("Jira key pattern is valid"));

/// Return the first Jira issue key found in `text`, if any.
#[must_use]
pub fn extract_jira_key(text: &str) -> Option<String> {
    JIRA_KEY_RE.find(text).map(|m| m.as_str().to_string())
}

/// Whether `text` is exactly one Jira issue key and nothing else.
#[must_use]
pub fn is_jira_key(text: &str) -> bool {
    EXACT_JIRA_KEY_RE.is_match(text)
}

/// Find the Jira key for a pull request: title first, then branch name.
#[must_use]
pub fn extract_jira_key_from_pull(title: &str, branch: &str) -> Option<String> {
    extract_jira_key(title).or_else(|| extract_jira_key(branch))
}
