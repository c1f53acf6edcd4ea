//! # Client Configuration
//!
//! Backend URLs, the request timeout and the cache sizing.
//! Values come from the environment (see [`ClientConfig::from_env`]); anything
//! unset keeps its default.

use std::time::Duration;

use crate::cache::CacheLimits;

pub const ENV_SMS_API_URL: &str = "PORTAL_SMS_API_URL";
pub const ENV_BILLING_API_URL: &str = "PORTAL_BILLING_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PORTAL_REQUEST_TIMEOUT_SECS";
pub const ENV_CACHE_BUFFER: &str = "PORTAL_CACHE_BUFFER";
pub const ENV_CACHE_CAPACITY: &str = "PORTAL_CACHE_CAPACITY";
pub const ENV_CACHE_TTL_SECS: &str = "PORTAL_CACHE_TTL_SECS";
pub const ENV_API_KEY: &str = "PORTAL_API_KEY";

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub sms_api_url: String,
    pub billing_api_url: String,
    pub request_timeout: Duration,
    /// Capacity of the query cache actor's channel.
    pub cache_buffer: usize,
    /// Bounds on the values the query cache keeps.
    pub cache_limits: CacheLimits,
    /// Environment variable holding the API key at start-up, if any.
    pub credential_env: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sms_api_url: "http://localhost:8000/api".to_string(),
            billing_api_url: "http://localhost:8001/api".to_string(),
            request_timeout: Duration::from_secs(30),
            cache_buffer: 64,
            cache_limits: CacheLimits::default(),
            credential_env: ENV_API_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_SMS_API_URL) {
            config.sms_api_url = parse_url(ENV_SMS_API_URL, url)?;
        }
        if let Some(url) = lookup(ENV_BILLING_API_URL) {
            config.billing_api_url = parse_url(ENV_BILLING_API_URL, url)?;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = parse_positive(ENV_REQUEST_TIMEOUT_SECS, &secs)?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(buffer) = lookup(ENV_CACHE_BUFFER) {
            config.cache_buffer = parse_positive(ENV_CACHE_BUFFER, &buffer)? as usize;
        }
        if let Some(capacity) = lookup(ENV_CACHE_CAPACITY) {
            config.cache_limits.capacity = parse_positive(ENV_CACHE_CAPACITY, &capacity)?;
        }
        if let Some(secs) = lookup(ENV_CACHE_TTL_SECS) {
            let secs = parse_positive(ENV_CACHE_TTL_SECS, &secs)?;
            config.cache_limits.time_to_live = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let invalid = |reason: &str| ConfigError::Invalid {
        var,
        value: value.clone(),
        reason: reason.to_string(),
    };
    let url = reqwest::Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host"));
    }
    // Endpoints start with '/', so the base carries no trailing one.
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}
