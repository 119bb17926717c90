use std::error::Error as StdError;
use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::redirect::Policy;

use super::types::ProbeOutcome;
use crate::config::ProbeSettings;
use crate::database::models::Target;

/// Performs a single availability check against a target.
///
/// Implementations never fail: every transport problem is folded into a
/// `down` outcome so the caller can persist it like any other result.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> ProbeOutcome;
}

/// HTTP GET prober
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .redirect(Policy::limited(settings.max_redirects))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();

        match self.client.get(&target.url).send().await {
            Ok(response) => {
                let latency = start.elapsed().as_millis() as u64;
                let status_code = response.status().as_u16();

                if status_code == target.expected_status_code {
                    ProbeOutcome::up(latency, status_code)
                } else {
                    ProbeOutcome::unexpected_status(latency, status_code)
                }
            }
            Err(e) => {
                let description = describe_transport_error(&e);
                tracing::debug!(target_id = target.id, url = %target.url, error = %description, "Probe failed");
                ProbeOutcome::transport_failure(description)
            }
        }
    }
}

/// Flatten a request error and its causes into one line.
///
/// reqwest's own message only names the URL; the useful part ("Connection
/// refused", "dns error", certificate problems) sits further down the chain.
pub fn describe_transport_error(error: &reqwest::Error) -> String {
    let mut description = if error.is_timeout() {
        "Request timed out".to_string()
    } else {
        error.to_string()
    };

    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }

    description
}
