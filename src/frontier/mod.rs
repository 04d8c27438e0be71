//! The crawl frontier
//!
//! One `Frontier` owns every admitted URL, the pending queue and the domain
//! politeness table. All of it sits behind a single mutex, so selection,
//! result reporting and admission never interleave: two callers can never be
//! handed the same URL, and domain counters are never updated from a stale read.

mod queue;
mod rate_limiter;
mod status;

pub use queue::{PendingQueue, QueuedUrl};
pub use rate_limiter::RateLimiter;
pub use status::{DomainStats, FailedUrl, FrontierStatus};

use crate::config::{validate_frontier_config, Config, FrontierConfig};
use crate::state::{Priority, UrlRecord, UrlStatus};
use crate::url::{extract_domain, normalize_url, UrlFilter};
use crate::{ConfigError, UrlError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Result of admitting a single acceptable URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// A new PENDING record was created
    Queued,

    /// An equivalent URL is already known (queued or terminal)
    Duplicate,
}

/// Priority queue, dedup index and per-URL state machine
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    max_retries: u32,
    stale_threshold: Duration,
    filter: UrlFilter,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Dedup index: normalized URL -> record
    records: HashMap<String, UrlRecord>,
    pending: PendingQueue,
    limiter: RateLimiter,
    urls_per_domain: HashMap<String, usize>,
    next_seq: u64,
    discovered: usize,
}

impl Inner {
    fn new(spacing: Duration) -> Self {
        Self {
            records: HashMap::new(),
            pending: PendingQueue::new(),
            limiter: RateLimiter::new(spacing),
            urls_per_domain: HashMap::new(),
            next_seq: 0,
            discovered: 0,
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.pending.clear();
        self.limiter.clear();
        self.urls_per_domain.clear();
        self.next_seq = 0;
        self.discovered = 0;
    }

    fn insert(
        &mut self,
        url: &str,
        normalized: String,
        domain: String,
        priority: Priority,
        depth: u32,
        discovered_from: Option<&str>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if discovered_from.is_some() {
            self.discovered += 1;
        }
        self.limiter.track(&domain);
        *self.urls_per_domain.entry(domain.clone()).or_insert(0) += 1;

        let record = UrlRecord::new(
            url.to_string(),
            normalized.clone(),
            domain,
            priority,
            depth,
            discovered_from.map(str::to_string),
            seq,
        );
        self.pending.push(QueuedUrl::from_record(&record));
        self.records.insert(normalized, record);
    }

    /// Moves PROCESSING records older than `threshold` back to PENDING
    fn recover_stale(&mut self, threshold: Duration, now: Instant) -> usize {
        let mut reclaimed = 0;
        for record in self.records.values_mut() {
            if record.is_stale(threshold, now) {
                record.release();
                self.pending.push(QueuedUrl::from_record(record));
                tracing::warn!(url = %record.normalized, "Reclaimed stale in-flight URL");
                reclaimed += 1;
            }
        }
        reclaimed
    }
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for a negative max depth or a zero
    /// retry budget.
    pub fn new(config: FrontierConfig, filter: UrlFilter) -> Result<Self, ConfigError> {
        validate_frontier_config(&config)?;
        let max_depth = u32::try_from(config.max_depth).map_err(|_| {
            ConfigError::Validation(format!("max_depth must be >= 0, got {}", config.max_depth))
        })?;

        Ok(Self {
            max_depth,
            max_retries: config.max_retries,
            stale_threshold: config.stale_threshold(),
            filter,
            inner: Mutex::new(Inner::new(config.spacing())),
        })
    }

    /// Builds the filter from `config.filters` and the frontier from `config.frontier`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let filter = UrlFilter::new(&config.filters)?;
        Self::new(config.frontier.clone(), filter)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Age after which a PROCESSING record is returned to the queue
    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Normalizes and validates a URL, returning its key and domain
    fn prepare(&self, url: &str, depth: u32) -> Result<(String, String), UrlError> {
        if depth > self.max_depth {
            return Err(UrlError::DepthExceeded {
                depth,
                max_depth: self.max_depth,
            });
        }

        let normalized = normalize_url(url)?;
        self.filter.check(&normalized)?;
        let domain = extract_domain(&normalized).ok_or(UrlError::MissingDomain)?;
        Ok((normalized.to_string(), domain))
    }

    /// Admits a single URL, reporting why it was rejected
    pub fn try_admit(
        &self,
        url: &str,
        priority: Priority,
        depth: u32,
        discovered_from: Option<&str>,
    ) -> Result<AdmitOutcome, UrlError> {
        let (normalized, domain) = self.prepare(url, depth)?;

        let mut inner = self.lock();
        if inner.records.contains_key(&normalized) {
            tracing::trace!(url = %normalized, "Already known");
            return Ok(AdmitOutcome::Duplicate);
        }

        tracing::debug!(url = %normalized, %priority, depth, "Admitted");
        inner.insert(url, normalized, domain, priority, depth, discovered_from);
        Ok(AdmitOutcome::Queued)
    }

    /// Admits a batch of URLs, silently skipping anything unacceptable
    ///
    /// Returns the number of newly queued URLs.
    pub fn admit<I, S>(
        &self,
        urls: I,
        priority: Priority,
        depth: u32,
        discovered_from: Option<&str>,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for url in urls {
            let url = url.as_ref();
            match self.try_admit(url, priority, depth, discovered_from) {
                Ok(AdmitOutcome::Queued) => added += 1,
                Ok(AdmitOutcome::Duplicate) => {}
                Err(e) => tracing::debug!("Skipping {}: {}", url, e),
            }
        }
        added
    }

    /// Admits links found on `parent` at low priority
    pub fn admit_discovered<I, S>(&self, urls: I, depth: u32, parent: &str) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admit(urls, Priority::Low, depth, Some(parent))
    }

    /// Returns the canonical form of every acceptable URL, in input order
    pub fn validate_urls<I, S>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter_map(|url| match self.prepare(url.as_ref(), 0) {
                Ok((normalized, _)) => Some(normalized),
                Err(e) => {
                    tracing::debug!("Invalid URL {}: {}", url.as_ref(), e);
                    None
                }
            })
            .collect()
    }

    /// Selects up to `n` URLs that may be fetched right now
    ///
    /// Candidates are taken in (priority, depth, admission) order. A candidate
    /// is skipped while its domain is inside the spacing window or in backoff,
    /// and no domain gets more than `ceil(n / 4)` slots in one batch. Selected
    /// records move to PROCESSING and their domain's request time is updated
    /// immediately.
    ///
    /// Stale PROCESSING records are reclaimed first.
    pub fn next_batch(&self, n: usize) -> Vec<String> {
        if n == 0 {
            return Vec::new();
        }

        let now = Instant::now();
        let mut guard = self.lock();
        guard.recover_stale(self.stale_threshold, now);

        let Inner {
            records,
            pending,
            limiter,
            ..
        } = &mut *guard;

        let per_domain_cap = (n + 3) / 4;
        let mut taken: HashMap<&str, usize> = HashMap::new();
        let mut selected: Vec<QueuedUrl> = Vec::new();

        for entry in pending.iter() {
            if selected.len() >= n {
                break;
            }

            let count = taken.entry(entry.domain.as_str()).or_insert(0);
            if *count >= per_domain_cap || !limiter.can_request(&entry.domain, now) {
                continue;
            }

            limiter.record_request(&entry.domain, now);
            *count += 1;
            selected.push(entry.clone());
        }
        drop(taken);

        for entry in &selected {
            pending.remove(entry);
            if let Some(record) = records.get_mut(&entry.url) {
                record.mark_dispatched(now);
            }
        }

        if !selected.is_empty() {
            tracing::debug!(
                selected = selected.len(),
                remaining = pending.len(),
                "Selected batch"
            );
        }

        selected.into_iter().map(|entry| entry.url).collect()
    }

    /// Feeds a fetch outcome back into the frontier
    ///
    /// Success completes the record and resets its domain's failure streak.
    /// Failure consumes one retry; the record returns to PENDING while retries
    /// remain and becomes FAILED otherwise, which counts against the domain.
    ///
    /// A PENDING record also accepts a result: this is how a late outcome
    /// lands after the record was reclaimed as stale. The record leaves the
    /// queue, so PENDING may move straight to COMPLETED or FAILED.
    ///
    /// Returns false (and changes nothing) for unknown or terminal URLs.
    pub fn report(
        &self,
        url: &str,
        success: bool,
        error: Option<&str>,
        duration: Duration,
    ) -> bool {
        let key = normalize_url(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        let now = Instant::now();

        let mut guard = self.lock();
        let inner = &mut *guard;

        let record = match inner.records.get_mut(&key) {
            Some(record) => record,
            None => {
                tracing::debug!(url = %key, "Result for unknown URL ignored");
                return false;
            }
        };

        if !record.status.accepts_result() {
            tracing::debug!(url = %key, status = %record.status, "Result for terminal URL ignored");
            return false;
        }

        let was_pending = record.status == UrlStatus::Pending;
        let queued = QueuedUrl::from_record(record);
        let domain = record.domain.clone();

        if success {
            record.mark_completed(duration);
            if was_pending {
                inner.pending.remove(&queued);
            }
            if inner.limiter.record_success(&domain) {
                tracing::info!(%domain, "Domain recovered, backoff cleared");
            }
            return true;
        }

        let terminal =
            record.mark_failed_attempt(error.map(str::to_string), duration, self.max_retries);

        if terminal {
            tracing::error!(
                url = %key,
                retries = record.retry_count,
                last_error = ?record.last_error,
                "URL failed permanently"
            );
            if was_pending {
                inner.pending.remove(&queued);
            }
            if let Some(backoff) = inner.limiter.record_terminal_failure(&domain, now) {
                tracing::warn!(%domain, ?backoff, "Domain entering backoff");
            }
        } else {
            tracing::debug!(
                url = %key,
                attempt = record.retry_count,
                max_retries = self.max_retries,
                "Fetch failed, will retry"
            );
            if !was_pending {
                inner.pending.push(queued);
            }
        }

        true
    }

    /// Counts of records by state
    pub fn status(&self) -> FrontierStatus {
        let inner = self.lock();
        let mut status = FrontierStatus {
            discovered: inner.discovered,
            domains_tracked: inner.limiter.len(),
            total_urls: inner.records.len(),
            ..FrontierStatus::default()
        };

        for record in inner.records.values() {
            match record.status {
                UrlStatus::Pending => status.pending += 1,
                UrlStatus::Processing => status.processing += 1,
                UrlStatus::Completed => status.completed += 1,
                UrlStatus::Failed => status.failed += 1,
            }
        }
        status.queue_size = status.pending + status.processing;
        status
    }

    /// Politeness counters for every tracked domain
    pub fn domain_stats(&self) -> BTreeMap<String, DomainStats> {
        let inner = self.lock();
        inner.limiter.stats(Instant::now(), &inner.urls_per_domain)
    }

    /// Every FAILED record, sorted by URL
    pub fn failed_urls(&self) -> Vec<FailedUrl> {
        let inner = self.lock();
        let mut failed: Vec<FailedUrl> = inner
            .records
            .values()
            .filter(|r| r.status == UrlStatus::Failed)
            .map(|r| FailedUrl {
                url: r.normalized.clone(),
                domain: r.domain.clone(),
                depth: r.depth,
                retry_count: r.retry_count,
                last_error: r.last_error.clone(),
                last_attempt: r.last_attempt,
                discovered_from: r.discovered_from.clone(),
            })
            .collect();
        failed.sort_by(|a, b| a.url.cmp(&b.url));
        failed
    }

    /// Puts every FAILED record back in the queue with a fresh retry budget
    pub fn reset_failed(&self) -> usize {
        let mut guard = self.lock();
        let Inner {
            records, pending, ..
        } = &mut *guard;

        let mut reset = 0;
        for record in records.values_mut() {
            if record.status == UrlStatus::Failed {
                record.reset();
                pending.push(QueuedUrl::from_record(record));
                reset += 1;
            }
        }

        if reset > 0 {
            tracing::info!(count = reset, "Reset failed URLs");
        }
        reset
    }

    /// Forgets every record and every domain
    pub fn clear(&self) {
        self.lock().clear();
        tracing::info!("Frontier cleared");
    }

    /// Snapshot of the record for any equivalent form of `url`
    pub fn record(&self, url: &str) -> Option<UrlRecord> {
        let key = normalize_url(url).ok()?.to_string();
        self.lock().records.get(&key).cloned()
    }

    /// Returns PROCESSING records to PENDING without consuming a retry
    ///
    /// Used when in-flight fetches are abandoned during shutdown.
    pub fn requeue<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut guard = self.lock();
        let Inner {
            records, pending, ..
        } = &mut *guard;

        let mut requeued = 0;
        for url in urls {
            let url = url.as_ref();
            let key = normalize_url(url)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| url.to_string());
            if let Some(record) = records.get_mut(&key) {
                if record.status == UrlStatus::Processing {
                    record.release();
                    pending.push(QueuedUrl::from_record(record));
                    requeued += 1;
                }
            }
        }
        requeued
    }

    /// Reclaims PROCESSING records that outlived the stale threshold
    pub fn recover_stale(&self) -> usize {
        self.lock()
            .recover_stale(self.stale_threshold, Instant::now())
    }

    /// How long until some pending URL's domain becomes eligible
    ///
    /// `Some(Duration::ZERO)` means a batch could be selected now; `None`
    /// means nothing is pending.
    pub fn next_ready_in(&self) -> Option<Duration> {
        let now = Instant::now();
        let inner = self.lock();

        let mut seen = HashSet::new();
        let mut soonest: Option<Duration> = None;
        for entry in inner.pending.iter() {
            if !seen.insert(entry.domain.as_str()) {
                continue;
            }
            match inner.limiter.time_until_eligible(&entry.domain, now) {
                None => return Some(Duration::ZERO),
                Some(wait) => soonest = Some(soonest.map_or(wait, |s| s.min(wait))),
            }
        }
        soonest
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }
}
