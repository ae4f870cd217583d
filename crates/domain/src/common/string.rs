//! String matching utilities used by the selectors.

/// Sentinel used by every "match anything" filter value.
pub const ALL: &str = "all";

/// Case-insensitive substring test.
///
/// An empty needle matches everything.
///
/// # Examples
///
/// ```
/// use fixdesk_domain::common::contains_ignore_case;
///
/// assert!(contains_ignore_case("AC Repair", "ac"));
/// assert!(contains_ignore_case("anything", ""));
/// assert!(!contains_ignore_case("Plumbing", "ac"));
/// ```
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Converts a blank (empty or whitespace-only) string to `None`.
///
/// # Examples
///
/// ```
/// use fixdesk_domain::common::none_if_blank;
///
/// assert_eq!(none_if_blank("hello"), Some("hello"));
/// assert_eq!(none_if_blank("  "), None);
/// ```
pub fn none_if_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
