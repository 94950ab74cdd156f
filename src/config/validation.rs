use crate::config::types::{ApiConfig, Config, CrawlerConfig, HttpConfig, PoolConfig};
use crate::ConfigError;
use url::Url;

const MAX_WORKERS: usize = 1024;
const MAX_ATTEMPTS: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_api_config(&config.api)?;
    validate_pool_config(&config.pool)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.max_connections_per_host == 0 {
        return Err(ConfigError::Validation(
            "max-connections-per-host must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the link API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.page_limit.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page-limit cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > MAX_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and {}, got {}",
            MAX_ATTEMPTS, config.max_attempts
        )));
    }

    Ok(())
}

/// Validates worker pool sizing
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue-capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    if config.output_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "output-capacity must be >= 1, got {}",
            config.output_capacity
        )));
    }

    Ok(())
}

/// Validates crawl run configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.frontier_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "frontier-path cannot be empty".to_string(),
        ));
    }

    if config.frontier_buffer < 1 {
        return Err(ConfigError::Validation(format!(
            "frontier-buffer must be >= 1, got {}",
            config.frontier_buffer
        )));
    }

    if config.deadline_secs < 1 {
        return Err(ConfigError::Validation(
            "deadline-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
