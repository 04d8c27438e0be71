//! HTML link extraction
//!
//! # Link Extraction Rules
//!
//! **Include:**
//! - `<a href="...">` and `<area href="...">`
//! - `<link href="...">` except stylesheet, icon and resource hints
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `javascript:`, `mailto:`, `tel:` and `data:` links
//! - Same-page fragment links
//!
//! `rel="nofollow"` links are followed.

use super::fetcher::Payload;
use super::traits::LinkExtractor;
use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// `<link rel=...>` values that never point at a page
const RESOURCE_RELS: &[&str] = &[
    "stylesheet",
    "icon",
    "apple-touch-icon",
    "manifest",
    "preload",
    "prefetch",
    "dns-prefetch",
    "preconnect",
    "modulepreload",
];

/// scraper-backed extractor for HTML payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, payload: &Payload) -> Vec<String> {
        if !payload.is_html() {
            return Vec::new();
        }
        match Url::parse(&payload.final_url) {
            Ok(base) => extract_links(&payload.body, &base),
            Err(_) => Vec::new(),
        }
    }
}

/// Extracts absolute, de-duplicated links from an HTML document
///
/// # Example
///
/// ```
/// use ripple_frontier::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/page">Link</a><a href="mailto:x@y.z">Mail</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base), vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |href: &str| {
        if let Some(url) = resolve_link(base_url, href) {
            let url = url.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    };

    if let Ok(selector) = Selector::parse("a[href], area[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[href]") {
        for element in document.select(&selector) {
            if is_resource_link(&element) {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

fn is_resource_link(element: &ElementRef<'_>) -> bool {
    element.value().attr("rel").map_or(false, |rel| {
        rel.split_ascii_whitespace()
            .any(|r| RESOURCE_RELS.contains(&r.to_ascii_lowercase().as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(html, &base_url())
    }

    #[test]
    fn test_extract_absolute_link() {
        let found = links(r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#);
        assert_eq!(found, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_extract_relative_link() {
        let found = links(r#"<html><body><a href="/other">Link</a></body></html>"#);
        assert_eq!(found, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let found = links(r#"<html><body><a href="other">Link</a></body></html>"#);
        assert_eq!(found, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_extract_area_link() {
        let found = links(r#"<map><area href="/region" alt="r"></map>"#);
        assert_eq!(found, vec!["https://example.com/region".to_string()]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r##"
            <a href="javascript:void(0)">js</a>
            <a href="mailto:test@example.com">mail</a>
            <a href="tel:+1234567890">call</a>
            <a href="data:text/html,<h1>Test</h1>">data</a>
            <a href="#section">jump</a>
        "##;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let found = links(r#"<a href="/file.bin" download>Download</a>"#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_follow_nofollow_links() {
        let found = links(r#"<a href="/page2" rel="nofollow">Link</a>"#);
        assert_eq!(found, vec!["https://example.com/page2".to_string()]);
    }

    #[test]
    fn test_link_tags() {
        let html = r#"
            <head>
                <link rel="canonical" href="https://example.com/canonical" />
                <link rel="next" href="/page?n=2" />
                <link rel="stylesheet" href="/style.css" />
                <link rel="shortcut icon" href="/favicon.ico" />
            </head>
        "#;
        assert_eq!(
            links(html),
            vec![
                "https://example.com/canonical".to_string(),
                "https://example.com/page?n=2".to_string()
            ]
        );
    }

    #[test]
    fn test_duplicates_collapsed() {
        let html = r#"<a href="/a">1</a><a href="/a">2</a><a href="https://example.com/a">3</a>"#;
        assert_eq!(links(html), vec!["https://example.com/a".to_string()]);
    }

    #[test]
    fn test_extractor_skips_non_html() {
        let payload = Payload {
            final_url: "https://example.com/data.json".to_string(),
            status_code: 200,
            content_type: "application/json".to_string(),
            body: r#"{"href": "<a href='/x'>"}"#.to_string(),
        };
        assert!(HtmlLinkExtractor.extract_links(&payload).is_empty());
    }

    #[test]
    fn test_extractor_resolves_against_final_url() {
        let payload = Payload {
            final_url: "https://example.com/docs/".to_string(),
            status_code: 200,
            content_type: "text/html".to_string(),
            body: r#"<a href="intro">Intro</a>"#.to_string(),
        };
        assert_eq!(
            HtmlLinkExtractor.extract_links(&payload),
            vec!["https://example.com/docs/intro".to_string()]
        );
    }
}
