use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::monitoring::types::{ProbeOutcome, SiteStatus};

pub const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 300;
pub const DEFAULT_EXPECTED_STATUS_CODE: u16 = 200;

/// Target model - a monitored website
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub url: String,
    pub name: Option<String>,
    pub check_interval_seconds: u64,
    pub expected_status_code: u16,
    pub created_at: DateTime<Utc>,
}

impl Target {
    /// Name used in alerts and logs, the URL when no name was given
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// Fields needed to register a target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTarget {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_expected_status")]
    pub expected_status_code: u16,
}

impl NewTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            check_interval_seconds: DEFAULT_CHECK_INTERVAL_SECONDS,
            expected_status_code: DEFAULT_EXPECTED_STATUS_CODE,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_interval(mut self, seconds: u64) -> Self {
        self.check_interval_seconds = seconds;
        self
    }

    pub fn with_expected_status(mut self, code: u16) -> Self {
        self.expected_status_code = code;
        self
    }
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECONDS
}

fn default_expected_status() -> u16 {
    DEFAULT_EXPECTED_STATUS_CODE
}

/// Observation model - one completed check, never modified after insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Assigned by the store on append
    pub id: Option<i64>,
    pub target_id: i64,
    pub status: SiteStatus,
    pub latency_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
    /// Set only when the status differs from the previous observation
    pub transition_at: Option<DateTime<Utc>>,
}

impl Observation {
    /// Build an unsaved observation from a probe outcome
    pub fn from_outcome(target_id: i64, outcome: ProbeOutcome, checked_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            target_id,
            status: outcome.status,
            latency_ms: outcome.latency_ms,
            status_code: outcome.status_code,
            error_message: outcome.error_message,
            checked_at,
            transition_at: None,
        }
    }

    pub fn is_transition(&self) -> bool {
        self.transition_at.is_some()
    }
}

/// Sink model - a webhook receiving status alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sink {
    pub id: i64,
    pub url: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSink {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Convert a timestamp to Unix milliseconds for storage
pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Convert stored Unix milliseconds back to a timestamp
pub fn i64_to_timestamp(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
