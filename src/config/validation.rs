use crate::config::types::{
    Config, FilterConfig, FrontierConfig, SchedulerConfig, SessionConfig, UserAgentConfig,
};
use crate::url::normalize_url;
use crate::ConfigError;
use regex::Regex;
use std::time::Duration;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_frontier_config(&config.frontier)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_session_config(&config.session)?;
    validate_filter_config(&config.filters)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_seeds(&config.seeds)?;
    validate_stale_threshold(config.frontier.stale_threshold(), &config.scheduler)?;
    Ok(())
}

/// Validates frontier limits
pub fn validate_frontier_config(config: &FrontierConfig) -> Result<(), ConfigError> {
    if config.max_depth < 0 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be >= 0, got {}",
            config.max_depth
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "max_retries must be >= 1, got 0".to_string(),
        ));
    }

    if config.stale_processing_timeout < 1 {
        return Err(ConfigError::Validation(
            "stale_processing_timeout must be >= 1s, got 0s".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a PROCESSING record outlives any fetch still running for it
///
/// A record is only reclaimed once the fetch timeout and the shutdown grace
/// period have both expired, so a live dispatch is never handed out twice.
pub fn validate_stale_threshold(
    stale: Duration,
    scheduler: &SchedulerConfig,
) -> Result<(), ConfigError> {
    let longest_fetch = scheduler.fetch_timeout() + scheduler.grace_period();
    if stale <= longest_fetch {
        return Err(ConfigError::Validation(format!(
            "stale_processing_timeout ({}s) must exceed fetch_timeout plus shutdown_grace_period ({}s)",
            stale.as_secs(),
            longest_fetch.as_secs()
        )));
    }
    Ok(())
}

/// Validates dispatch loop settings
pub fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch_size must be >= 1, got 0".to_string(),
        ));
    }

    if config.fetch_timeout < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout must be >= 1s, got 0s".to_string(),
        ));
    }

    if config.idle_poll_interval < 1 {
        return Err(ConfigError::Validation(
            "idle_poll_interval must be >= 1ms, got 0ms".to_string(),
        ));
    }

    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.ttl < 1 {
        return Err(ConfigError::Validation(
            "session ttl must be >= 1s, got 0s".to_string(),
        ));
    }
    Ok(())
}

/// Validates allow-list patterns and skip expressions
pub fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    for pattern in &config.skip_patterns {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid skip pattern '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Ok(())
}

fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        normalize_url(seed).map_err(|e| {
            ConfigError::Validation(format!("Invalid seed URL '{}': {}", seed, e))
        })?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Ports are allowed so local test servers can be allow-listed
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
