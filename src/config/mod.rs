//! Configuration module for IG-Harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and reading the newline-delimited account list.
//!
//! # Example
//!
//! ```no_run
//! use ig_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {}", config.crawler.base_url);
//! ```

mod accounts;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, RateLimitConfig, UserAgentConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use accounts::{load_accounts, parse_accounts};
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
