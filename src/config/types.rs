use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Desktop browser string sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36";

/// Main configuration structure for IG-Harvest
///
/// Every section is optional; a missing file or section yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Origin of the profile pages and the GraphQL endpoint
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of feed entries requested per pagination call
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Maximum number of image downloads in flight for one account
    #[serde(rename = "max-concurrent-downloads")]
    pub max_concurrent_downloads: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            page_size: 50,
            max_concurrent_downloads: 4,
            request_timeout_secs: 30,
        }
    }
}

/// User agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Inter-account delay configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Lower bound of the pause after each account (inclusive)
    #[serde(rename = "min-delay-secs")]
    pub min_delay_secs: u64,

    /// Upper bound of the pause after each account (exclusive)
    #[serde(rename = "max-delay-secs")]
    pub max_delay_secs: u64,
}

impl RateLimitConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 10,
            max_delay_secs: 60,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; artifacts land in `<image-dir>/instagram_<account>/`
    #[serde(rename = "image-dir")]
    pub image_dir: PathBuf,

    /// Directory holding the date-stamped audit logs
    #[serde(rename = "log-dir")]
    pub log_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("./instagram"),
            log_dir: PathBuf::from("./log"),
        }
    }
}
