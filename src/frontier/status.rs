//! Read-only snapshots handed out by the frontier

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Record counts by lifecycle state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrontierStatus {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,

    /// Records admitted with a parent page
    pub discovered: usize,

    /// Records not yet terminal (`pending + processing`)
    pub queue_size: usize,

    pub domains_tracked: usize,
    pub total_urls: usize,
}

impl FrontierStatus {
    /// True once every admitted record has reached a terminal state
    pub fn is_drained(&self) -> bool {
        self.queue_size == 0
    }
}

/// Politeness counters for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainStats {
    pub request_count: u64,

    /// Minimum spacing between dispatches
    pub rate_limit: Duration,

    pub consecutive_failures: u32,
    pub in_backoff: bool,

    /// Time left in backoff, if any
    pub backoff_remaining: Option<Duration>,

    /// Records admitted for this domain
    pub urls: usize,
}

/// A record that exhausted its retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub domain: String,
    pub depth: u32,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub discovered_from: Option<String>,
}
