//! Tolerant environment variable access.
//!
//! CI metadata is best effort: a missing or non-unicode variable reads as an
//! empty string and never produces an error.

/// Value of `name`, or an empty string when unset.
#[must_use]
pub fn var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Value of `name`, or `None` when unset or empty.
#[must_use]
pub fn var_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Whether `name` is set to something other than a false-ish value.
///
/// Empty, `0`, `false`, `no` and `off` (any case) count as not set.
#[must_use]
pub fn truthy(name: &str) -> bool {
    var_opt(name).is_some_and(|value| {
        !matches!(value.to_lowercase().as_str(), "0" | "false" | "no" | "off")
    })
}

/// Whether any of `names` is [`truthy`].
#[must_use]
pub fn any_truthy(names: &[&str]) -> bool {
    names.iter().any(|name| truthy(name))
}

/// Strip a leading `refs/heads/` from a git reference.
#[must_use]
pub fn strip_branch_prefix(reference: &str) -> &str {
    reference.strip_prefix("refs/heads/").unwrap_or(reference)
}
