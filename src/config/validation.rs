use crate::config::types::{ApiConfig, Config, CrawlerConfig, InputConfig, OutputConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API connection settings
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.token.trim().is_empty() {
        return Err(ConfigError::Validation("token cannot be empty".to_string()));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.detail_concurrency < 1 || config.detail_concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "detail_concurrency must be between 1 and 32, got {}",
            config.detail_concurrency
        )));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates the seed list location
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.seeds_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "seeds_path cannot be empty".to_string(),
        ));
    }

    if config.column.trim().is_empty() {
        return Err(ConfigError::Validation("column cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let names = [
        ("checkpoint", &config.checkpoint),
        ("edges", &config.edges),
        ("items", &config.items),
        ("temp_edges", &config.temp_edges),
        ("temp_items", &config.temp_items),
    ];

    for (key, name) in &names {
        if name.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
        }
    }

    for (i, (key_a, name_a)) in names.iter().enumerate() {
        for (key_b, name_b) in &names[i + 1..] {
            if name_a == name_b {
                return Err(ConfigError::Validation(format!(
                    "{} and {} must name different files, both are '{}'",
                    key_a, key_b, name_a
                )));
            }
        }
    }

    if config.max_flush_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_flush_failures must be >= 1, got {}",
            config.max_flush_failures
        )));
    }

    Ok(())
}
