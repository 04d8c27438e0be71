//! Bounded-concurrency dispatch loop
//!
//! The scheduler pulls batches from the frontier, runs each fetch under a
//! dispatch permit and feeds every outcome back:
//! - the result goes to `Frontier::report`
//! - discovered links go through `DiscoveryFeedback`
//! - counters go to `DispatchMetrics`
//!
//! Permits are owned by the spawned task, so they are released when the fetch
//! settles, fails, panics or is aborted.

use super::discovery::DiscoveryFeedback;
use super::fetcher::FetchResult;
use super::metrics::{DispatchMetrics, DispatchStats};
use super::session::SessionContext;
use super::traits::{Fetcher, LinkExtractor, SessionProvider};
use crate::config::{validate_scheduler_config, validate_stale_threshold, SchedulerConfig};
use crate::frontier::Frontier;
use crate::{ConfigError, FetchError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// State shared by the scheduler and its dispatch tasks
struct Shared {
    frontier: Arc<Frontier>,
    fetcher: Arc<dyn Fetcher>,
    discovery: DiscoveryFeedback,
    metrics: DispatchMetrics,
    fetch_timeout: Duration,

    /// URLs currently being fetched by this scheduler
    in_flight: Mutex<HashSet<String>>,
}

/// One URL handed to a dispatch task
struct Job {
    url: String,
    session: Option<SessionContext>,
    extractor: Option<Arc<dyn LinkExtractor>>,
    _permit: OwnedSemaphorePermit,
}

impl Shared {
    fn in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches one URL and reports the outcome
    async fn dispatch(self: Arc<Self>, job: Job) {
        let url = job.url.as_str();

        self.metrics.record_dispatch();
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.fetch_timeout,
            self.fetcher.fetch(url, job.session.as_ref()),
        )
        .await;
        let elapsed = started.elapsed();

        match settle(outcome) {
            Ok(result) => {
                self.frontier.report(url, true, None, elapsed);
                self.metrics.record_outcome(true, elapsed);
                self.feed_discovery(url, &result, job.extractor.as_deref());
            }
            Err(error) => {
                tracing::debug!(url, error = %error, "Fetch failed");
                self.frontier.report(url, false, Some(&error), elapsed);
                self.metrics.record_outcome(false, elapsed);
            }
        }

        self.in_flight().remove(url);
    }

    fn feed_discovery(&self, url: &str, result: &FetchResult, extractor: Option<&dyn LinkExtractor>) {
        let mut links = result.discovered_links.clone();
        if let (Some(extractor), Some(payload)) = (extractor, &result.payload) {
            links.extend(extractor.extract_links(payload));
        }
        if links.is_empty() {
            return;
        }

        let depth = match self.frontier.record(url) {
            Some(record) => record.depth,
            None => return,
        };
        self.discovery.feed(&self.frontier, url, depth, &links);
    }
}

/// Collapses the timeout, fetcher error and `success == false` cases
fn settle(
    outcome: Result<Result<FetchResult, FetchError>, tokio::time::error::Elapsed>,
) -> Result<FetchResult, String> {
    match outcome {
        Ok(Ok(result)) if result.success => Ok(result),
        Ok(Ok(result)) => Err(result
            .error
            .unwrap_or_else(|| "fetch reported failure".to_string())),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(FetchError::Timeout.to_string()),
    }
}

/// Dispatches frontier work to a fetcher with at most `max_workers` in flight
pub struct Scheduler {
    shared: Arc<Shared>,
    semaphore: Arc<Semaphore>,
    sessions: Arc<dyn SessionProvider>,
    extractor: Option<Arc<dyn LinkExtractor>>,
    session_id: Option<String>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Creates a scheduler over `frontier`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an out-of-range worker count,
    /// a zero batch size or a zero fetch timeout. Also fails when the
    /// frontier would reclaim a record before its fetch could time out.
    pub fn new(
        frontier: Arc<Frontier>,
        fetcher: Arc<dyn Fetcher>,
        sessions: Arc<dyn SessionProvider>,
        config: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        validate_scheduler_config(&config)?;
        validate_stale_threshold(frontier.stale_threshold(), &config)?;

        tracing::debug!(
            max_workers = config.max_workers,
            batch_size = config.batch_size,
            follow_external = config.follow_external_links,
            "Creating scheduler"
        );

        let shared = Shared {
            frontier,
            fetcher,
            discovery: DiscoveryFeedback::new(config.follow_external_links),
            metrics: DispatchMetrics::new(),
            fetch_timeout: config.fetch_timeout(),
            in_flight: Mutex::new(HashSet::new()),
        };

        Ok(Self {
            shared: Arc::new(shared),
            semaphore: Arc::new(Semaphore::new(config.max_workers as usize)),
            sessions,
            extractor: None,
            session_id: None,
            config,
        })
    }

    /// Runs fetched payloads through `extractor` for discovery
    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Attaches the session `id` to every dispatch
    pub fn with_session(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.shared.frontier
    }

    /// Snapshot of the dispatch counters
    pub fn stats(&self) -> DispatchStats {
        self.shared
            .metrics
            .snapshot(self.sessions.active_sessions())
    }

    /// Free dispatch permits
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Selects a batch sized to the free permits and spawns its fetches
    fn dispatch_ready(&self, tasks: &mut JoinSet<()>) -> usize {
        let capacity = self
            .semaphore
            .available_permits()
            .min(self.config.batch_size as usize);
        if capacity == 0 {
            return 0;
        }

        let batch = self.shared.frontier.next_batch(capacity);
        if batch.is_empty() {
            return 0;
        }

        let session = self.current_session();
        let mut spawned = 0;
        for url in batch {
            let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    self.shared.frontier.requeue([&url]);
                    continue;
                }
            };
            self.shared.in_flight().insert(url.clone());
            let job = Job {
                url,
                session: session.clone(),
                extractor: self.extractor.clone(),
                _permit: permit,
            };
            tasks.spawn(Arc::clone(&self.shared).dispatch(job));
            spawned += 1;
        }
        spawned
    }

    fn current_session(&self) -> Option<SessionContext> {
        let id = self.session_id.as_deref()?;
        let session = self.sessions.session(id);
        if session.is_none() {
            tracing::debug!(session = id, "Session unknown or expired, dispatching without it");
        }
        session
    }

    /// Runs one scheduling cycle: select a batch, dispatch it, await every result
    ///
    /// Returns the number of URLs dispatched.
    pub async fn run_once(&self) -> usize {
        let mut tasks = JoinSet::new();
        let dispatched = self.dispatch_ready(&mut tasks);
        if dispatched > 0 {
            tracing::info!(dispatched, "Dispatched batch");
        }
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        dispatched
    }

    /// Dispatches until the frontier drains or `cancel` fires
    ///
    /// On cancellation no new work is started. In-flight fetches get the
    /// configured grace period; anything still running after that is aborted
    /// and its URL returned to PENDING without a retry penalty.
    pub async fn run(&self, cancel: CancellationToken) -> DispatchStats {
        let frontier = Arc::clone(&self.shared.frontier);
        let idle_poll = self.config.idle_poll();
        let mut tasks: JoinSet<()> = JoinSet::new();

        tracing::info!(
            pending = frontier.status().pending,
            max_workers = self.config.max_workers,
            "Scheduler started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if self.dispatch_ready(&mut tasks) > 0 {
                tokio::task::yield_now().await;
                continue;
            }

            if tasks.is_empty() && frontier.status().is_drained() {
                tracing::info!("Frontier drained");
                break;
            }

            if self.semaphore.available_permits() == 0 {
                // Only a settling fetch can free a permit
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(joined) = tasks.join_next() => log_join(joined),
                }
                continue;
            }

            let wait = frontier
                .next_ready_in()
                .map_or(idle_poll, |ready| ready.min(idle_poll))
                .max(Duration::from_millis(1));

            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        if cancel.is_cancelled() {
            self.shutdown(&mut tasks).await;
        }

        let stats = self.stats();
        tracing::info!(
            dispatched = stats.dispatched,
            successes = stats.successes,
            failures = stats.failures,
            "Scheduler stopped"
        );
        stats
    }

    async fn shutdown(&self, tasks: &mut JoinSet<()>) {
        let grace = self.config.grace_period();
        tracing::info!(
            in_flight = tasks.len(),
            ?grace,
            "Shutdown requested, waiting for in-flight fetches"
        );

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                log_join(joined);
            }
        })
        .await;

        if drained.is_err() {
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}

            let abandoned: Vec<String> = self.shared.in_flight().drain().collect();
            let requeued = self.shared.frontier.requeue(&abandoned);
            tracing::warn!(
                abandoned = abandoned.len(),
                requeued,
                "Grace period elapsed, in-flight fetches aborted"
            );
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Dispatch task panicked");
        }
    }
}
