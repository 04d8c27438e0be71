/// Checks if a domain falls under an allow-list entry
///
/// Matching is by label-aware suffix: an entry covers the bare domain and
/// every subdomain beneath it. A leading `*.` on the entry is accepted and
/// means the same thing.
///
/// # Examples
///
/// ```
/// use ripple_frontier::url::matches_domain_suffix;
///
/// assert!(matches_domain_suffix("example.com", "example.com"));
/// assert!(matches_domain_suffix("example.com", "blog.example.com"));
/// assert!(matches_domain_suffix("*.example.com", "api.v2.example.com"));
/// assert!(!matches_domain_suffix("example.com", "notexample.com"));
/// ```
pub fn matches_domain_suffix(entry: &str, candidate: &str) -> bool {
    let base = entry.strip_prefix("*.").unwrap_or(entry);
    if base.is_empty() {
        return false;
    }

    candidate == base
        || (candidate.len() > base.len()
            && candidate.ends_with(base)
            && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.')
}

/// Checks a candidate against every entry; an empty list allows everything
pub fn matches_any(entries: &[String], candidate: &str) -> bool {
    entries.is_empty()
        || entries
            .iter()
            .any(|entry| matches_domain_suffix(entry, candidate))
}
