use super::domain::{extract_domain, extract_host};
use super::matcher::matches_any;
use super::normalize::normalize_url;
use crate::config::FilterConfig;
use crate::{ConfigError, UrlError};
use regex::{RegexSet, RegexSetBuilder};
use url::{Host, Url};

/// Accept/reject policy applied to every normalized URL before admission
#[derive(Debug, Clone)]
pub struct UrlFilter {
    skip: RegexSet,
    allowed_domains: Vec<String>,
}

impl UrlFilter {
    /// Compiles the skip patterns and captures the allow-list
    pub fn new(config: &FilterConfig) -> Result<Self, ConfigError> {
        let skip = RegexSetBuilder::new(&config.skip_patterns)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern(format!("Invalid skip pattern: {}", e)))?;

        let allowed_domains = config
            .allowed_domains
            .iter()
            .map(|d| d.to_lowercase())
            .collect();

        Ok(Self {
            skip,
            allowed_domains,
        })
    }

    /// Checks a normalized URL, explaining the rejection
    pub fn check(&self, url: &Url) -> Result<(), UrlError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(UrlError::InvalidScheme(other.to_string())),
        }

        match url.host() {
            Some(Host::Domain(name)) if name == "localhost" || name.contains('.') => {}
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {}
            Some(Host::Domain(name)) => {
                return Err(self.excluded(url, format!("host '{}' has no top-level domain", name)))
            }
            None => return Err(UrlError::MissingDomain),
        }

        // Paths are checked on their own so `/report.pdf?v=2` is still caught
        if self.skip.is_match(url.as_str()) || self.skip.is_match(url.path()) {
            return Err(self.excluded(url, "matches skip pattern".to_string()));
        }

        if !self.allowed_domains.is_empty() {
            let domain = extract_domain(url).unwrap_or_default();
            let host = extract_host(url).unwrap_or_default();
            if !matches_any(&self.allowed_domains, &domain)
                && !matches_any(&self.allowed_domains, &host)
            {
                return Err(self.excluded(url, format!("domain '{}' not allowed", domain)));
            }
        }

        Ok(())
    }

    /// Normalizes then checks a raw URL
    pub fn is_valid(&self, raw: &str) -> bool {
        normalize_url(raw)
            .and_then(|url| self.check(&url))
            .is_ok()
    }

    fn excluded(&self, url: &Url, reason: String) -> UrlError {
        UrlError::Excluded {
            url: url.to_string(),
            reason,
        }
    }
}
