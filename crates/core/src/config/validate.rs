use super::{types::Config, ConfigError};
use crate::retry::RetryConfig;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Poll interval, job timeout and readiness settings are non-zero
/// - Every retry policy allows at least one attempt
/// - The model sync source, when set, is a remote prefix
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    // Engine validation
    if config.engine.url.trim().is_empty() {
        return Err(invalid("engine.url cannot be empty"));
    }
    if config.engine.request_timeout_secs == 0 {
        return Err(invalid("engine.request_timeout_secs cannot be 0"));
    }

    // Job validation
    if config.jobs.poll_interval_ms == 0 {
        return Err(invalid("jobs.poll_interval_ms cannot be 0"));
    }
    if config.jobs.timeout_secs == 0 {
        return Err(invalid("jobs.timeout_secs cannot be 0"));
    }

    // Readiness validation
    if config.readiness.max_attempts == 0 {
        return Err(invalid("readiness.max_attempts cannot be 0"));
    }
    if config.readiness.interval_ms == 0 {
        return Err(invalid("readiness.interval_ms cannot be 0"));
    }

    // Retry budgets
    check_retry("jobs.submit_retry", &config.jobs.submit_retry)?;
    check_retry("storage.download_retry", &config.storage.download_retry)?;
    check_retry("storage.upload_retry", &config.storage.upload_retry)?;

    // Model sync validation
    if let Some(source) = &config.model_sync.source {
        if !source.is_remote() {
            return Err(invalid(format!(
                "model_sync.source must be an s3:// prefix, got '{}'",
                source
            )));
        }
    }
    if config.model_sync.timeout_secs == Some(0) {
        return Err(invalid("model_sync.timeout_secs cannot be 0"));
    }

    Ok(())
}

fn check_retry(name: &str, retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_attempts == 0 {
        return Err(invalid(format!("{}.max_attempts cannot be 0", name)));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
