//! Pull-request context shared by all providers.

use serde::Serialize;

/// Source branch, target branch and identifier of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestConfig {
    /// Source (head) branch.
    pub branch: String,
    /// Target (base) branch.
    pub base: String,
    /// Identifying key, usually the pull request number.
    pub key: String,
}

/// Extract the pull request number from a ref like `refs/pull/42/merge`.
///
/// Both the `merge` and `head` forms are recognized. Anything else,
/// including a non-numeric key, yields `None`.
#[must_use]
pub fn parse_pull_request_key(reference: &str) -> Option<&str> {
    let rest = reference.strip_prefix("refs/pull/")?;
    let (key, suffix) = rest.split_once('/')?;
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    matches!(suffix, "merge" | "head").then_some(key)
}

/// Whether `reference` points at a pull request.
#[must_use]
pub fn is_pull_request_ref(reference: &str) -> bool {
    parse_pull_request_key(reference).is_some()
}
