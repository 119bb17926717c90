use thiserror::Error;
use url::Url;

use crate::database::models::{NewSink, NewTarget};

/// Longest interval that still fits a millisecond timestamp difference
pub const MAX_CHECK_INTERVAL_SECONDS: u64 = (i64::MAX / 1000) as u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("URL must include scheme (http:// or https://)")]
    MissingScheme,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid scheme '{0}'. Must be http or https")]
    UnsupportedScheme(String),
    #[error("URL must have a valid host")]
    MissingHost,
    #[error("Check interval must be greater than zero")]
    ZeroInterval,
    #[error("Check interval of {0} seconds is too long (maximum {max})", max = MAX_CHECK_INTERVAL_SECONDS)]
    IntervalTooLong(u64),
    #[error("Expected status code {0} is not a valid HTTP status (100-599)")]
    InvalidStatusCode(u16),
}

/// Validate an HTTP/HTTPS URL and return it in normalized form
pub fn validate_http_url(target: &str) -> Result<String, ValidationError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(target).map_err(|e| {
        if !target.contains("://") {
            ValidationError::MissingScheme
        } else {
            ValidationError::InvalidUrl(e.to_string())
        }
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingHost);
    }

    Ok(url.to_string())
}

/// Validate a target before it is registered.
///
/// Intervals shorter than the scheduler tick are accepted, but such targets
/// are still only checked once per tick; `tick_seconds` is used to warn about it.
pub fn validate_new_target(target: &NewTarget, tick_seconds: u64) -> Result<NewTarget, ValidationError> {
    let url = validate_http_url(&target.url)?;

    if target.check_interval_seconds == 0 {
        return Err(ValidationError::ZeroInterval);
    }

    if target.check_interval_seconds > MAX_CHECK_INTERVAL_SECONDS {
        return Err(ValidationError::IntervalTooLong(target.check_interval_seconds));
    }

    if !(100..=599).contains(&target.expected_status_code) {
        return Err(ValidationError::InvalidStatusCode(target.expected_status_code));
    }

    if target.check_interval_seconds < tick_seconds {
        tracing::warn!(
            url = %url,
            interval = target.check_interval_seconds,
            tick = tick_seconds,
            "Check interval is shorter than the scheduler tick, it will be checked once per tick"
        );
    }

    Ok(NewTarget {
        url,
        name: target.name.as_ref().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        ..target.clone()
    })
}

pub fn validate_new_sink(sink: &NewSink) -> Result<NewSink, ValidationError> {
    Ok(NewSink {
        url: validate_http_url(&sink.url)?,
        name: sink.name.as_ref().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    })
}
