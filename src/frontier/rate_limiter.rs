//! Per-domain politeness table

use super::status::DomainStats;
use crate::state::DomainState;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Owns one `DomainState` per domain seen by the frontier
#[derive(Debug)]
pub struct RateLimiter {
    spacing: Duration,
    domains: HashMap<String, DomainState>,
}

impl RateLimiter {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            domains: HashMap::new(),
        }
    }

    /// Starts tracking a domain; no-op if it is already known
    pub fn track(&mut self, domain: &str) {
        if !self.domains.contains_key(domain) {
            self.domains
                .insert(domain.to_string(), DomainState::new(domain));
        }
    }

    /// Checks spacing and backoff; unknown domains are always eligible
    pub fn can_request(&self, domain: &str, now: Instant) -> bool {
        self.domains
            .get(domain)
            .map_or(true, |state| state.can_request(self.spacing, now))
    }

    pub fn record_request(&mut self, domain: &str, now: Instant) {
        self.state_mut(domain).record_request(now);
    }

    /// Returns true if the domain was in backoff before this success
    pub fn record_success(&mut self, domain: &str) -> bool {
        let state = self.state_mut(domain);
        let was_backed_off = state.backoff_until.is_some();
        state.record_success();
        was_backed_off
    }

    pub fn record_terminal_failure(&mut self, domain: &str, now: Instant) -> Option<Duration> {
        self.state_mut(domain).record_terminal_failure(now)
    }

    pub fn time_until_eligible(&self, domain: &str, now: Instant) -> Option<Duration> {
        self.domains
            .get(domain)
            .and_then(|state| state.time_until_eligible(self.spacing, now))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn clear(&mut self) {
        self.domains.clear();
    }

    /// Snapshot of every tracked domain, keyed and sorted by domain
    pub fn stats(
        &self,
        now: Instant,
        urls_per_domain: &HashMap<String, usize>,
    ) -> BTreeMap<String, DomainStats> {
        self.domains
            .iter()
            .map(|(domain, state)| {
                let stats = DomainStats {
                    request_count: state.request_count,
                    rate_limit: self.spacing,
                    consecutive_failures: state.consecutive_failures,
                    in_backoff: state.in_backoff(now),
                    backoff_remaining: state.backoff_remaining(now),
                    urls: urls_per_domain.get(domain).copied().unwrap_or(0),
                };
                (domain.clone(), stats)
            })
            .collect()
    }

    fn state_mut(&mut self, domain: &str) -> &mut DomainState {
        self.domains
            .entry(domain.to_string())
            .or_insert_with(|| DomainState::new(domain))
    }
}
