//! Crawl coordinator - wires the engine together from a `Config`
//!
//! The coordinator owns one frontier, one session store and one scheduler
//! backed by the reqwest fetcher and the HTML link extractor. It seeds the
//! frontier, runs the scheduler until the frontier drains or the crawl is
//! cancelled, and collects a `CrawlSummary`.

use super::fetcher::HttpFetcher;
use super::parser::HtmlLinkExtractor;
use super::scheduler::Scheduler;
use super::session::SessionStore;
use super::traits::SessionProvider;
use crate::config::Config;
use crate::frontier::Frontier;
use crate::output::CrawlSummary;
use crate::state::Priority;
use crate::FrontierError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How often crawl progress is logged while the scheduler runs
const PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    frontier: Arc<Frontier>,
    sessions: Arc<SessionStore>,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Builds every component from `config`
    ///
    /// # Errors
    ///
    /// Fails if the frontier or scheduler settings are invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self, FrontierError> {
        let frontier = Arc::new(Frontier::from_config(&config)?);
        let sessions = Arc::new(SessionStore::from_config(&config.session));
        let fetcher = Arc::new(HttpFetcher::from_config(
            &config.user_agent,
            config.scheduler.fetch_timeout(),
        )?);

        let scheduler = Scheduler::new(
            Arc::clone(&frontier),
            fetcher,
            Arc::clone(&sessions) as Arc<dyn SessionProvider>,
            config.scheduler.clone(),
        )?
        .with_extractor(Arc::new(HtmlLinkExtractor));

        Ok(Self {
            config,
            frontier,
            sessions,
            scheduler,
        })
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    /// Session store used by the scheduler, for registering credentials
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Dispatches every fetch with the session `id`
    pub fn with_session(mut self, id: impl Into<String>) -> Self {
        self.scheduler = self.scheduler.with_session(id);
        self
    }

    /// Admits the configured seeds plus `extra` at high priority, depth 0
    ///
    /// Returns the number of newly queued URLs.
    pub fn seed(&self, extra: &[String]) -> usize {
        let seeds = self.config.seeds.iter().chain(extra.iter());
        let added = self.frontier.admit(seeds, Priority::High, 0, None);
        tracing::info!(
            seeds = self.config.seeds.len() + extra.len(),
            added,
            "Seeded frontier"
        );
        added
    }

    /// Runs the scheduler until the frontier drains or `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) -> CrawlSummary {
        let started = Instant::now();

        let progress = cancel.child_token();
        let reporter = tokio::spawn(report_progress(
            Arc::clone(&self.frontier),
            progress.clone(),
        ));

        let dispatch = self.scheduler.run(cancel).await;

        progress.cancel();
        if let Err(e) = reporter.await {
            tracing::debug!(error = %e, "Progress reporter ended abnormally");
        }

        let expired = self.sessions.cleanup_expired();
        if expired > 0 {
            tracing::debug!(expired, "Purged expired sessions");
        }

        let summary = CrawlSummary {
            status: self.frontier.status(),
            dispatch,
            failed: self.frontier.failed_urls(),
            domains: self.frontier.domain_stats(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            completed = summary.status.completed,
            failed = summary.status.failed,
            pending = summary.status.pending,
            elapsed = ?summary.elapsed,
            "Crawl finished"
        );
        summary
    }
}

/// Logs frontier counts every `PROGRESS_INTERVAL` until `stop` fires
async fn report_progress(frontier: Arc<Frontier>, stop: CancellationToken) {
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let status = frontier.status();
                tracing::info!(
                    completed = status.completed,
                    failed = status.failed,
                    pending = status.pending,
                    processing = status.processing,
                    domains = status.domains_tracked,
                    "Progress"
                );
            }
        }
    }
}

/// Runs a complete crawl from `config`
///
/// # Example
///
/// ```no_run
/// use ripple_frontier::config::load_config;
/// use ripple_frontier::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let summary = run_crawl(config, CancellationToken::new()).await?;
/// println!("{} pages completed", summary.status.completed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlSummary, FrontierError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.seed(&[]);
    Ok(coordinator.run(cancel).await)
}
