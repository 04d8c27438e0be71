use super::url_status::{Priority, UrlStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Everything the frontier knows about one admitted URL
///
/// Records are created on admission and never removed (short of
/// `Frontier::clear`); terminal records stay around for reporting.
#[derive(Debug, Clone)]
pub struct UrlRecord {
    /// The URL as it was first submitted
    pub url: String,

    /// Canonical form, unique across the frontier
    pub normalized: String,

    /// Rate-limiting domain
    pub domain: String,

    pub priority: Priority,

    /// Link distance from a seed
    pub depth: u32,

    /// Page this URL was discovered on, if any
    pub discovered_from: Option<String>,

    pub status: UrlStatus,

    /// Failed attempts so far
    pub retry_count: u32,

    /// Wall-clock time of the last dispatch
    pub last_attempt: Option<DateTime<Utc>>,

    pub last_error: Option<String>,

    /// Duration of the last reported fetch
    pub processing_time: Option<Duration>,

    /// Admission order, used to break ties in the pending queue
    pub(crate) seq: u64,

    /// Monotonic dispatch time, used for stale recovery
    pub(crate) dispatched_at: Option<Instant>,
}

impl UrlRecord {
    pub(crate) fn new(
        url: String,
        normalized: String,
        domain: String,
        priority: Priority,
        depth: u32,
        discovered_from: Option<String>,
        seq: u64,
    ) -> Self {
        Self {
            url,
            normalized,
            domain,
            priority,
            depth,
            discovered_from,
            status: UrlStatus::Pending,
            retry_count: 0,
            last_attempt: None,
            last_error: None,
            processing_time: None,
            seq,
            dispatched_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// PENDING -> PROCESSING
    pub(crate) fn mark_dispatched(&mut self, now: Instant) {
        self.status = UrlStatus::Processing;
        self.last_attempt = Some(Utc::now());
        self.dispatched_at = Some(now);
    }

    /// -> COMPLETED
    pub(crate) fn mark_completed(&mut self, duration: Duration) {
        self.status = UrlStatus::Completed;
        self.processing_time = Some(duration);
        self.last_error = None;
        self.dispatched_at = None;
    }

    /// Counts a failed attempt
    ///
    /// The record goes back to PENDING while attempts remain, otherwise it
    /// becomes FAILED. Returns true when the failure was terminal.
    pub(crate) fn mark_failed_attempt(
        &mut self,
        error: Option<String>,
        duration: Duration,
        max_retries: u32,
    ) -> bool {
        self.retry_count = (self.retry_count + 1).min(max_retries);
        self.last_error = error;
        self.processing_time = Some(duration);
        self.dispatched_at = None;

        if self.retry_count < max_retries {
            self.status = UrlStatus::Pending;
            false
        } else {
            self.status = UrlStatus::Failed;
            true
        }
    }

    /// PROCESSING -> PENDING without touching the retry budget
    pub(crate) fn release(&mut self) {
        self.status = UrlStatus::Pending;
        self.dispatched_at = None;
    }

    /// FAILED -> PENDING with a fresh retry budget
    pub(crate) fn reset(&mut self) {
        self.status = UrlStatus::Pending;
        self.retry_count = 0;
        self.dispatched_at = None;
    }

    /// Whether this record has sat in PROCESSING for at least `threshold`
    pub(crate) fn is_stale(&self, threshold: Duration, now: Instant) -> bool {
        self.status == UrlStatus::Processing
            && self
                .dispatched_at
                .map_or(true, |at| now.saturating_duration_since(at) >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UrlRecord {
        UrlRecord::new(
            "https://Example.com/a/".to_string(),
            "https://example.com/a".to_string(),
            "example.com".to_string(),
            Priority::Medium,
            1,
            Some("https://example.com/".to_string()),
            7,
        )
    }

    #[test]
    fn test_new_record_is_pending() {
        let record = record();
        assert_eq!(record.status, UrlStatus::Pending);
        assert_eq!(record.retry_count, 0);
        assert!(record.last_attempt.is_none());
        assert!(!record.is_terminal());
    }

    #[test]
    fn test_dispatch_and_complete() {
        let mut record = record();
        record.mark_dispatched(Instant::now());
        assert_eq!(record.status, UrlStatus::Processing);
        assert!(record.last_attempt.is_some());

        record.mark_completed(Duration::from_millis(120));
        assert_eq!(record.status, UrlStatus::Completed);
        assert_eq!(record.processing_time, Some(Duration::from_millis(120)));
        assert!(record.is_terminal());
    }

    #[test]
    fn test_retry_budget() {
        let mut record = record();

        assert!(!record.mark_failed_attempt(Some("timeout".into()), Duration::ZERO, 3));
        assert_eq!(record.status, UrlStatus::Pending);
        assert!(!record.mark_failed_attempt(Some("timeout".into()), Duration::ZERO, 3));
        assert_eq!(record.retry_count, 2);

        assert!(record.mark_failed_attempt(Some("HTTP 503".into()), Duration::ZERO, 3));
        assert_eq!(record.status, UrlStatus::Failed);
        assert_eq!(record.retry_count, 3);
        assert_eq!(record.last_error.as_deref(), Some("HTTP 503"));
    }

    #[test]
    fn test_release_keeps_retry_count() {
        let mut record = record();
        record.mark_failed_attempt(None, Duration::ZERO, 3);
        record.mark_dispatched(Instant::now());

        record.release();
        assert_eq!(record.status, UrlStatus::Pending);
        assert_eq!(record.retry_count, 1);
    }

    #[test]
    fn test_reset_restores_budget() {
        let mut record = record();
        record.mark_failed_attempt(None, Duration::ZERO, 1);
        assert_eq!(record.status, UrlStatus::Failed);

        record.reset();
        assert_eq!(record.status, UrlStatus::Pending);
        assert_eq!(record.retry_count, 0);
    }

    #[test]
    fn test_is_stale() {
        let mut record = record();
        let now = Instant::now();
        let threshold = Duration::from_secs(300);

        assert!(!record.is_stale(threshold, now));

        record.mark_dispatched(now);
        assert!(!record.is_stale(threshold, now + Duration::from_secs(299)));
        assert!(record.is_stale(threshold, now + Duration::from_secs(300)));
    }
}
