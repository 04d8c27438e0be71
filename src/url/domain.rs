use url::Url;

/// Extracts the rate-limiting domain from a URL
///
/// The domain is the lowercase host, plus the port when it is not the
/// scheme's default. Two servers on the same host but different ports are
/// throttled independently.
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain, e.g. `example.com` or `127.0.0.1:8080`
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_frontier::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("localhost:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns the bare lowercase host, ignoring any port
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
