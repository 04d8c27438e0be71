//! Configuration module for Ripple-Frontier
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use ripple_frontier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("frontier.toml")).unwrap();
//! println!("Frontier will admit up to depth {}", config.frontier.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FilterConfig, FrontierConfig, SchedulerConfig, SessionConfig, UserAgentConfig,
    DEFAULT_SKIP_PATTERNS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{
    validate, validate_filter_config, validate_frontier_config, validate_scheduler_config,
    validate_stale_threshold,
};
