//! Deep-crawl feedback: links found on a fetched page go back into the frontier

use crate::frontier::Frontier;
use crate::url::{resolve_link, same_domain};
use url::Url;

/// Re-admits discovered links one level deeper than their source page
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryFeedback {
    follow_external: bool,
}

impl DiscoveryFeedback {
    pub fn new(follow_external: bool) -> Self {
        Self { follow_external }
    }

    pub fn follows_external(&self) -> bool {
        self.follow_external
    }

    /// Resolves links against `source` and keeps the followable ones
    ///
    /// Unless external following is enabled, only links on the source's own
    /// domain survive.
    pub fn candidates(&self, source: &Url, links: &[String]) -> Vec<String> {
        links
            .iter()
            .filter_map(|href| resolve_link(source, href))
            .filter(|url| self.follow_external || same_domain(source, url))
            .map(|url| url.to_string())
            .collect()
    }

    /// Admits the links found on `source` (fetched at `source_depth`)
    ///
    /// Returns the number of newly queued URLs. Nothing is admitted when the
    /// children would exceed the frontier's max depth.
    pub fn feed(
        &self,
        frontier: &Frontier,
        source: &str,
        source_depth: u32,
        links: &[String],
    ) -> usize {
        if links.is_empty() {
            return 0;
        }

        let child_depth = source_depth.saturating_add(1);
        if child_depth > frontier.max_depth() {
            tracing::trace!(
                source,
                source_depth,
                "Source at max depth, discovered links dropped"
            );
            return 0;
        }

        let base = match Url::parse(source) {
            Ok(base) => base,
            Err(e) => {
                tracing::debug!("Cannot resolve links from {}: {}", source, e);
                return 0;
            }
        };

        let candidates = self.candidates(&base, links);
        let added = frontier.admit_discovered(&candidates, child_depth, source);
        if added > 0 {
            tracing::debug!(
                source,
                found = links.len(),
                added,
                depth = child_depth,
                "Admitted discovered links"
            );
        }
        added
    }
}
