use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use super::payload::AlertPayload;
use crate::database::models::Sink;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Sink returned non-success status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound transport for alert documents
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, sink: &Sink, payload: &AlertPayload) -> Result<(), DeliveryError>;
}

/// Posts alerts as JSON to the sink URL
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, sink: &Sink, payload: &AlertPayload) -> Result<(), DeliveryError> {
        let response = self.client.post(&sink.url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(DeliveryError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }
}
