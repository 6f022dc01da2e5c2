use crate::config::types::{Config, CrawlerConfig, OutputConfig, RateLimitConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest page the upstream API accepts for `first`
const MAX_PAGE_SIZE: u32 = 50;

/// Longest pause allowed between two accounts (one day)
const MAX_DELAY_SECS: u64 = 86_400;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "https" && base.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.max_concurrent_downloads < 1 || config.max_concurrent_downloads > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-downloads must be between 1 and 32, got {}",
            config.max_concurrent_downloads
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the inter-account delay range
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.min_delay_secs >= config.max_delay_secs {
        return Err(ConfigError::Validation(format!(
            "min-delay-secs ({}) must be lower than max-delay-secs ({})",
            config.min_delay_secs, config.max_delay_secs
        )));
    }

    if config.max_delay_secs > MAX_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "max-delay-secs must be at most {}, got {}",
            MAX_DELAY_SECS, config.max_delay_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.image_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "image-dir cannot be empty".to_string(),
        ));
    }

    if config.log_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("log-dir cannot be empty".to_string()));
    }

    Ok(())
}
