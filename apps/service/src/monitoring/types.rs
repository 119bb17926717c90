use serde::{Deserialize, Serialize};

/// Status of a site as seen by one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Up,
    Down,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Up => "up",
            SiteStatus::Down => "down",
        }
    }
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SiteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(SiteStatus::Up),
            "down" => Ok(SiteStatus::Down),
            other => Err(format!("unknown site status: {other}")),
        }
    }
}

/// Classified result of a single probe, before it is stamped and persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status: SiteStatus,

    /// Round-trip time in milliseconds, only when a response came back
    pub latency_ms: Option<u64>,

    /// HTTP status code of the final response (after redirects)
    pub status_code: Option<u16>,

    /// Failure description, only on `down`
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    /// The site answered with the expected status code
    pub fn up(latency_ms: u64, status_code: u16) -> Self {
        Self {
            status: SiteStatus::Up,
            latency_ms: Some(latency_ms),
            status_code: Some(status_code),
            error_message: None,
        }
    }

    /// The site answered, but not with the expected status code
    pub fn unexpected_status(latency_ms: u64, status_code: u16) -> Self {
        Self {
            status: SiteStatus::Down,
            latency_ms: Some(latency_ms),
            status_code: Some(status_code),
            error_message: Some(format!("Unexpected status code: {status_code}")),
        }
    }

    /// No response at all: refused, timed out, DNS, TLS, ...
    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self {
            status: SiteStatus::Down,
            latency_ms: None,
            status_code: None,
            error_message: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [SiteStatus::Up, SiteStatus::Down] {
            assert_eq!(status.as_str().parse::<SiteStatus>().unwrap(), status);
        }
        assert!("degraded".parse::<SiteStatus>().is_err());
    }

    #[test]
    fn unexpected_status_keeps_latency() {
        let outcome = ProbeOutcome::unexpected_status(42, 503);
        assert_eq!(outcome.status, SiteStatus::Down);
        assert_eq!(outcome.latency_ms, Some(42));
        assert_eq!(outcome.error_message.as_deref(), Some("Unexpected status code: 503"));
    }

    #[test]
    fn transport_failure_has_no_latency() {
        let outcome = ProbeOutcome::transport_failure("Connection refused");
        assert_eq!(outcome.status, SiteStatus::Down);
        assert!(outcome.latency_ms.is_none());
        assert!(outcome.status_code.is_none());
    }
}
