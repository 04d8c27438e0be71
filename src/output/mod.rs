//! Output module for crawl summaries
//!
//! This module handles:
//! - Collecting the end-of-run `CrawlSummary`
//! - Printing it for humans
//! - Exporting it as JSON

pub mod stats;

pub use stats::{print_summary, success_rate};

use crate::crawler::DispatchStats;
use crate::frontier::{DomainStats, FailedUrl, FrontierStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Everything known about a finished (or cancelled) crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    /// Record counts at the end of the run
    pub status: FrontierStatus,

    /// Dispatch counters from the scheduler
    pub dispatch: DispatchStats,

    /// URLs that exhausted their retries
    pub failed: Vec<FailedUrl>,

    /// Per-domain politeness counters
    pub domains: BTreeMap<String, DomainStats>,

    /// Wall time spent in the scheduler
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// True when nothing is left pending or in flight
    pub fn is_complete(&self) -> bool {
        self.status.is_drained()
    }

    /// Domains still backing off when the run ended
    pub fn domains_in_backoff(&self) -> Vec<&str> {
        self.domains
            .iter()
            .filter(|(_, stats)| stats.in_backoff)
            .map(|(domain, _)| domain.as_str())
            .collect()
    }

    /// Pretty-printed JSON rendering
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
