//! IG-Harvest: an incremental profile feed harvester
//!
//! This crate walks a public profile's media feed through the paginated,
//! cursor-based GraphQL API and downloads every still image exactly once.
//! Accounts are crawled one after another with a randomized pause between them.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

pub use crawler::FetchError;
pub use storage::StorageError;

/// Main error type for IG-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Query identifier not found in {script_url} ({matches} candidate(s))")]
    SignatureNotFound { script_url: String, matches: usize },

    #[error("Script asset link missing from profile page {url}")]
    ScriptAssetMissing { url: String },

    #[error("Payload decode error ({context}): {message}")]
    PayloadDecode { context: String, message: String },

    #[error("Invalid walk transition from {from} on {event}")]
    InvalidTransition {
        from: state::WalkState,
        event: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

impl HarvestError {
    /// Builds a decode error for the given payload shape
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadDecode {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for IG-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{Account, CrawlSession, WalkState};
