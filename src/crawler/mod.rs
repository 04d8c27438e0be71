//! Dispatch side of the engine
//!
//! This module contains everything between the frontier and the network:
//! - The capability traits the scheduler is built from
//! - The reqwest fetcher and the scraper link extractor
//! - Session credentials with expiry
//! - The bounded-concurrency scheduler and its counters
//! - Discovery feedback into the frontier
//! - The coordinator that wires it all from a `Config`

mod coordinator;
mod discovery;
mod fetcher;
mod metrics;
mod parser;
mod scheduler;
mod session;
mod traits;

pub use coordinator::{run_crawl, Coordinator};
pub use discovery::DiscoveryFeedback;
pub use fetcher::{build_http_client, FetchResult, HttpFetcher, Payload};
pub use metrics::{DispatchMetrics, DispatchStats};
pub use parser::{extract_links, HtmlLinkExtractor};
pub use scheduler::Scheduler;
pub use session::{SessionAuth, SessionContext, SessionStore};
pub use traits::{Fetcher, LinkExtractor, SessionProvider};
