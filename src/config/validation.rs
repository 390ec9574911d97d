use crate::config::types::{Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;

const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be at least 1 second".to_string(),
        ));
    }

    if config.connect_timeout == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout must be at least 1 second".to_string(),
        ));
    }

    if config.idle_timeout == Some(0) {
        return Err(ConfigError::Validation(
            "idle_timeout must be at least 1 second when set".to_string(),
        ));
    }

    if config.ignored_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "ignored_extensions must list at least one extension".to_string(),
        ));
    }

    for extension in &config.ignored_extensions {
        validate_extension(extension)?;
    }

    Ok(())
}

/// Validates an ignored extension: non-empty, alphanumeric, no leading dot
fn validate_extension(extension: &str) -> Result<(), ConfigError> {
    if extension.is_empty() {
        return Err(ConfigError::Validation(
            "ignored extensions cannot be empty".to_string(),
        ));
    }

    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "ignored extension must be alphanumeric without a dot, got '{}'",
            extension
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}
