use crate::UrlError;
use std::borrow::Cow;
use url::Url;

/// Click identifiers stripped alongside the `utm_*` family
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into its canonical dedup form
///
/// # Normalization Steps
///
/// 1. Trim whitespace; prepend `https://` when the input carries no scheme
/// 2. Parse the URL; reject if malformed or if it has no host
/// 3. Lowercase the host
/// 4. Drop the default port (80 for http, 443 for https)
/// 5. Resolve dot segments and strip trailing slashes (except for root /)
/// 6. Remove fragment
/// 7. Drop blank-valued and tracking query parameters
/// 8. Sort remaining parameters by key, then value
///
/// The scheme itself is preserved: `http://` and `https://` forms of a page
/// are distinct entities.
///
/// Normalization is idempotent: feeding the output back in yields the same URL.
///
/// # Examples
///
/// ```
/// use ripple_frontier::url::normalize_url;
///
/// let url = normalize_url("EXAMPLE.COM:443/page/?b=2&a=1&utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let candidate: Cow<'_, str> = if needs_default_scheme(trimmed) {
        Cow::Owned(format!("https://{}", trimmed))
    } else {
        Cow::Borrowed(trimmed)
    };

    let mut url =
        Url::parse(&candidate).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    if url.cannot_be_a_base() {
        return Err(UrlError::MissingDomain);
    }

    // The url crate lowercases hosts and drops default ports for http(s)
    // already; other schemes need the host folded by hand.
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingDomain)?
        .to_string();
    let lowered = host.to_lowercase();
    if lowered != host {
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let stripped = path.trim_end_matches('/');
        let stripped = if stripped.is_empty() { "/" } else { stripped }.to_string();
        url.set_path(&stripped);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params.iter());
        }
    }

    Ok(url)
}

/// Whether a raw string lacks a scheme and should be read as `https://...`
///
/// `example.com/path` and `localhost:8080` carry no scheme, while
/// `mailto:x@y` and `javascript:void(0)` do.
fn needs_default_scheme(raw: &str) -> bool {
    if raw.contains("://") {
        return false;
    }
    match raw.split_once(':') {
        None => true,
        Some((scheme, rest)) => {
            scheme.contains('.') || rest.starts_with(|c: char| c.is_ascii_digit())
        }
    }
}

/// Filters out blank and tracking parameters and sorts the remainder
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, value)| !key.is_empty() && !value.is_empty() && !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
