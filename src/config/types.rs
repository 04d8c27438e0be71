use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Ripple-Frontier
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    /// Seed URLs admitted at high priority and depth 0
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Admission, retry and politeness limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Maximum depth at which a URL may be admitted
    #[serde(rename = "max-depth")]
    pub max_depth: i32,

    /// Failed attempts after which a URL becomes terminal
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Minimum time between dispatches to the same domain (milliseconds)
    #[serde(rename = "min-domain-spacing")]
    pub min_domain_spacing: u64,

    /// Seconds a record may sit in processing before it is reclaimed
    #[serde(rename = "stale-processing-timeout")]
    pub stale_processing_timeout: u64,
}

impl FrontierConfig {
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.min_domain_spacing)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_processing_timeout)
    }
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_retries: 3,
            min_domain_spacing: 1000,
            stale_processing_timeout: 300,
        }
    }
}

/// Dispatch loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of concurrent dispatch permits
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Largest batch pulled from the frontier in one cycle
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Admit discovered links that point at other domains
    #[serde(rename = "follow-external-links")]
    pub follow_external_links: bool,

    /// Upper bound on a single fetch (seconds)
    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: u64,

    /// Time in-flight fetches get to settle after shutdown (seconds)
    #[serde(rename = "shutdown-grace-period")]
    pub shutdown_grace_period: u64,

    /// Longest idle sleep between empty scheduling cycles (milliseconds)
    #[serde(rename = "idle-poll-interval")]
    pub idle_poll_interval: u64,
}

impl SchedulerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_period)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_interval)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            batch_size: 20,
            follow_external_links: false,
            fetch_timeout: 30,
            shutdown_grace_period: 10,
            idle_poll_interval: 250,
        }
    }
}

/// Session lifetime configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session stays valid after creation
    pub ttl: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl: 3600 }
    }
}

/// URL acceptance rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Domain patterns (e.g., "example.com" or "*.example.com"); empty allows all
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Case-insensitive regular expressions matched against the whole URL
    #[serde(rename = "skip-patterns")]
    pub skip_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            skip_patterns: DEFAULT_SKIP_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Binary, media and document resources plus non-navigable schemes
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[
    r"\.pdf$",
    r"\.docx?$",
    r"\.xlsx?$",
    r"\.zip$",
    r"\.rar$",
    r"\.tar$",
    r"\.gz$",
    r"\.jpe?g$",
    r"\.png$",
    r"\.gif$",
    r"\.svg$",
    r"\.mp4$",
    r"\.avi$",
    r"\.mov$",
    r"\.wmv$",
    r"\.mp3$",
    r"\.wav$",
    r"\.ogg$",
    r"^mailto:",
    r"^tel:",
    r"^ftp:",
    r"^javascript:",
];

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Ripple-Frontier".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}
