//! Capabilities the scheduler is built from
//!
//! Each role is a narrow trait so tests and embedders can swap in their own
//! implementation without touching the dispatch loop.

use super::fetcher::{FetchResult, Payload};
use super::session::SessionContext;
use crate::FetchError;
use async_trait::async_trait;

/// Performs the network fetch for one URL
///
/// Returning `Err` and returning a result with `success == false` are
/// treated the same way: one failed attempt.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        session: Option<&SessionContext>,
    ) -> Result<FetchResult, FetchError>;
}

/// Pulls followable links out of fetched content
///
/// Links may be relative; discovery resolves them against the source URL.
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, payload: &Payload) -> Vec<String>;
}

/// Looks up session credentials by id
pub trait SessionProvider: Send + Sync {
    /// Returns the session if it exists and has not expired
    fn session(&self, id: &str) -> Option<SessionContext>;

    /// Number of live sessions
    fn active_sessions(&self) -> usize;
}
