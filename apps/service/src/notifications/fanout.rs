use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::payload::AlertPayload;
use super::webhook::{DeliveryError, Notifier};
use crate::database::models::{Observation, Sink, Target};
use crate::monitoring::types::SiteStatus;

/// Result of one delivery attempt
#[derive(Debug)]
pub struct Delivery {
    pub sink_id: i64,
    pub result: Result<(), DeliveryError>,
}

/// Per-sink outcomes of one fan-out
#[derive(Debug, Default)]
pub struct FanoutReport {
    pub deliveries: Vec<Delivery>,
}

impl FanoutReport {
    pub fn attempted(&self) -> usize {
        self.deliveries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.deliveries.iter().filter(|d| d.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| d.result.is_err())
    }
}

/// Sends one alert per sink for a detected transition
pub struct NotificationFanout {
    notifier: Arc<dyn Notifier>,
}

impl NotificationFanout {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Deliver to every sink concurrently.
    ///
    /// Never fails: each sink gets exactly one attempt and a failed sink
    /// does not affect the others. Failures are logged and reported back.
    pub async fn notify(
        &self,
        target: &Target,
        observation: &Observation,
        previous_status: Option<SiteStatus>,
        sinks: &[Sink],
    ) -> FanoutReport {
        if sinks.is_empty() {
            return FanoutReport::default();
        }

        let payload = AlertPayload::for_transition(target, observation, previous_status);

        let attempts = sinks.iter().map(|sink| {
            let payload = &payload;
            async move {
                let result = self.notifier.deliver(sink, payload).await;
                if let Err(e) = &result {
                    warn!(
                        sink_id = sink.id,
                        sink = sink.name.as_deref().unwrap_or(&sink.url),
                        target_id = target.id,
                        error = %e,
                        "Failed to deliver status alert"
                    );
                }
                Delivery { sink_id: sink.id, result }
            }
        });

        let report = FanoutReport { deliveries: join_all(attempts).await };

        info!(
            target_id = target.id,
            status = %observation.status,
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            "Status alert fan-out finished"
        );

        report
    }
}
