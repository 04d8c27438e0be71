//! URL handling for Ripple-Frontier
//!
//! Canonicalization, domain extraction, allow-list matching and the
//! admission filter. Every URL the frontier sees passes through here first.

mod domain;
mod filter;
mod matcher;
mod normalize;

pub use domain::{extract_domain, extract_host};
pub use filter::UrlFilter;
pub use matcher::{matches_any, matches_domain_suffix};
pub use normalize::normalize_url;

use url::Url;

/// Schemes that never resolve to a fetchable page
const NON_NAVIGABLE_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves an href found on `base` to an absolute http(s) URL
///
/// Returns `None` for empty hrefs, same-page anchors, non-navigable schemes
/// and anything that does not resolve to http or https.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if NON_NAVIGABLE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Whether two URLs share a rate-limiting domain
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
