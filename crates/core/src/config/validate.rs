use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - api.base_url is not empty
/// - api.timeout_secs is not 0
/// - jobs.poll_interval_ms is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.jobs.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}
