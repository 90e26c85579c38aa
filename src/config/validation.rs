use crate::config::types::Options;
use crate::url::compile_all;
use crate::ConfigError;
use reqwest::header::HeaderValue;
use std::time::Duration;

/// Longest per-request timeout accepted (one day)
const MAX_PER_REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Validates walk options
pub fn validate(options: &Options) -> Result<(), ConfigError> {
    if let Some(user_agent) = &options.user_agent {
        validate_user_agent(user_agent)?;
    }

    if options.per_request_timeout > MAX_PER_REQUEST_TIMEOUT {
        return Err(ConfigError::Validation(format!(
            "per_request_timeout must be at most {:?}, got {:?}",
            MAX_PER_REQUEST_TIMEOUT, options.per_request_timeout
        )));
    }

    compile_all(&options.include)?;
    compile_all(&options.exclude)?;

    Ok(())
}

/// Validates a user agent: non-empty and usable as a header value
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    let trimmed = user_agent.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if HeaderValue::from_str(trimmed).is_err() {
        return Err(ConfigError::Validation(format!(
            "user_agent contains characters not allowed in a header: {:?}",
            user_agent
        )));
    }

    Ok(())
}
