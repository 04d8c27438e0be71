use std::time::Duration;
use tokio::time::Instant;

/// Consecutive terminal failures before a domain is backed off
pub const BACKOFF_THRESHOLD: u32 = 3;

/// Largest backoff exponent: 2^6 = 64 minutes
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Tracks the politeness state of a domain
///
/// Spacing and backoff are independent gates. Spacing throttles the steady
/// request rate; backoff suspends the domain entirely after repeated
/// terminal failures.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// The domain this state belongs to
    pub domain: String,

    /// When a URL on this domain was last selected for dispatch
    pub last_request_time: Option<Instant>,

    /// Number of dispatches made to this domain
    pub request_count: u64,

    /// Terminal failures since the last success
    pub consecutive_failures: u32,

    /// No dispatch to this domain before this instant
    pub backoff_until: Option<Instant>,
}

impl DomainState {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            last_request_time: None,
            request_count: 0,
            consecutive_failures: 0,
            backoff_until: None,
        }
    }

    /// Checks if a URL on this domain may be dispatched now
    ///
    /// Both conditions must hold:
    /// - at least `spacing` has passed since the last dispatch
    /// - the domain is not in backoff
    pub fn can_request(&self, spacing: Duration, now: Instant) -> bool {
        self.spacing_remaining(spacing, now).is_none() && !self.in_backoff(now)
    }

    pub fn in_backoff(&self, now: Instant) -> bool {
        self.backoff_until.map_or(false, |until| now < until)
    }

    /// Records a dispatch
    ///
    /// Called at selection time, before the fetch completes, so that a
    /// second batch cannot pick this domain inside the spacing window.
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Resets the failure streak and lifts any backoff
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.backoff_until = None;
    }

    /// Counts a terminal failure, entering backoff once the streak is long enough
    ///
    /// Returns the backoff length when one was (re)started.
    pub fn record_terminal_failure(&mut self, now: Instant) -> Option<Duration> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.consecutive_failures < BACKOFF_THRESHOLD {
            return None;
        }

        let backoff = backoff_duration(self.consecutive_failures);
        self.backoff_until = Some(now + backoff);
        Some(backoff)
    }

    /// Time left before the spacing window closes, if it is still open
    pub fn spacing_remaining(&self, spacing: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < spacing).then(|| spacing - elapsed)
    }

    /// Time left in backoff, if the domain is backed off
    pub fn backoff_remaining(&self, now: Instant) -> Option<Duration> {
        let until = self.backoff_until?;
        (now < until).then(|| until - now)
    }

    /// Calculates how long until this domain becomes eligible
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_eligible(&self, spacing: Duration, now: Instant) -> Option<Duration> {
        match (
            self.spacing_remaining(spacing, now),
            self.backoff_remaining(now),
        ) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or_default().max(b.unwrap_or_default())),
        }
    }
}

/// Backoff after `failures` consecutive terminal failures
///
/// 2^min(failures - 2, 6) minutes: 2, 4, 8 ... capped at 64.
pub fn backoff_duration(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(2).min(MAX_BACKOFF_EXPONENT);
    Duration::from_secs(60 * (1u64 << exponent))
}
