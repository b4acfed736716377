use super::models::Config;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid endpoint base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Endpoint path must start with '/': {path}")]
    InvalidPath { path: String },

    #[error("Timeout must be positive: {field}")]
    InvalidTimeout { field: String },

    #[error("User agent must not be empty")]
    EmptyUserAgent,

    #[error("Channel capacity must be positive")]
    InvalidChannelCapacity,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_endpoint(config)?;
    validate_http(config)?;
    validate_worker(config)?;
    Ok(())
}

fn validate_endpoint(config: &Config) -> Result<(), ValidationError> {
    let base_url = &config.endpoint.base_url;
    let invalid = |reason: String| ValidationError::InvalidBaseUrl {
        url: base_url.clone(),
        reason,
    };

    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }

    // The task query is appended after the path
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_string()));
    }

    if !config.endpoint.path.starts_with('/') {
        return Err(ValidationError::InvalidPath {
            path: config.endpoint.path.clone(),
        });
    }

    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.connect_timeout_ms == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "http.connect_timeout_ms".to_string(),
        });
    }

    if config.http.request_timeout_ms == Some(0) {
        return Err(ValidationError::InvalidTimeout {
            field: "http.request_timeout_ms".to_string(),
        });
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    if config.worker.channel_capacity == 0 {
        return Err(ValidationError::InvalidChannelCapacity);
    }
    Ok(())
}
