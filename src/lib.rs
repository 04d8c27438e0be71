//! Ripple-Frontier: the crawl frontier and scheduling engine
//!
//! This crate decides *what* gets fetched and *when*: it admits and
//! canonicalizes URLs, deduplicates them, orders them by priority, keeps
//! every domain inside its politeness window, backs off from domains that keep
//! failing, and dispatches work to an injected fetcher with bounded
//! concurrency. Links found on fetched pages flow back in one level deeper.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Dispatch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are raised at construction time, before any URL is admitted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL admission errors
///
/// A URL rejected with one of these never enters the frontier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("URL {url} excluded: {reason}")]
    Excluded { url: String, reason: String },

    #[error("Depth {depth} exceeds maximum depth {max_depth}")]
    DepthExceeded { depth: u32, max_depth: u32 },
}

/// Errors produced while fetching a single URL
///
/// All of these are treated as retryable failures by the scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Ripple-Frontier operations
pub type Result<T> = std::result::Result<T, FrontierError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchResult, Fetcher, LinkExtractor, Scheduler, SessionStore};
pub use frontier::{AdmitOutcome, DomainStats, Frontier, FrontierStatus};
pub use state::{DomainState, Priority, UrlRecord, UrlStatus};
pub use url::{extract_domain, normalize_url, UrlFilter};
