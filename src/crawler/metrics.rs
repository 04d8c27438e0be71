//! Aggregate dispatch counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters updated by dispatch tasks
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    dispatched: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    latency_micros: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_outcome(&self, success: bool, latency: Duration) {
        if success {
            self.successes.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.fetch_add(micros, Ordering::SeqCst);
    }

    pub fn snapshot(&self, active_sessions: usize) -> DispatchStats {
        let dispatched = self.dispatched.load(Ordering::SeqCst);
        let successes = self.successes.load(Ordering::SeqCst);
        let failures = self.failures.load(Ordering::SeqCst);
        let total_latency = Duration::from_micros(self.latency_micros.load(Ordering::SeqCst));

        let settled = successes + failures;
        let (success_rate, average_latency) = if settled == 0 {
            (0.0, Duration::ZERO)
        } else {
            (
                successes as f64 / settled as f64,
                total_latency / u32::try_from(settled).unwrap_or(u32::MAX),
            )
        };

        DispatchStats {
            dispatched,
            successes,
            failures,
            total_latency,
            success_rate,
            average_latency,
            active_sessions,
        }
    }
}

/// Read-only view of the dispatch counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_latency: Duration,

    /// Successes over settled fetches, 0.0 before anything settles
    pub success_rate: f64,

    pub average_latency: Duration,
    pub active_sessions: usize,
}
