use crate::config::types::{Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
pub const MAX_CONCURRENCY_LIMIT: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawl engine configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > MAX_CONCURRENCY_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY_LIMIT, config.max_concurrency
        )));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }

    if config.slow_host_threshold == 0 {
        return Err(ConfigError::Validation(
            "slow_host_threshold must be greater than 0ms".to_string(),
        ));
    }

    // 2^max_retries must stay representable when computing backoff
    if config.max_retries > 63 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 63, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
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

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}
