use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::prober::Prober;
use super::transition::mark_transition;
use super::types::SiteStatus;
use crate::database::{Observation, Registry, RegistryResult, Target};
use crate::notifications::{FanoutReport, NotificationFanout};

/// What one check of one target produced
#[derive(Debug)]
pub struct CheckReport {
    /// The persisted observation, with its id
    pub observation: Observation,
    /// Present only when the check was a transition
    pub notifications: Option<FanoutReport>,
}

impl CheckReport {
    pub fn transitioned(&self) -> bool {
        self.observation.is_transition()
    }
}

/// Monitoring executor - runs the probe, detect, persist, notify sequence for one target
pub struct MonitoringExecutor {
    registry: Arc<dyn Registry>,
    prober: Arc<dyn Prober>,
    fanout: Arc<NotificationFanout>,
}

impl MonitoringExecutor {
    pub fn new(
        registry: Arc<dyn Registry>,
        prober: Arc<dyn Prober>,
        fanout: Arc<NotificationFanout>,
    ) -> Self {
        Self { registry, prober, fanout }
    }

    /// Check `target` once.
    ///
    /// `previous` must be the latest stored observation for the target.
    /// Only persistence errors are returned; alert delivery problems end up
    /// in the report.
    pub async fn execute_check(
        &self,
        target: &Target,
        previous: Option<&Observation>,
        now: DateTime<Utc>,
    ) -> RegistryResult<CheckReport> {
        let outcome = self.prober.probe(target).await;
        let observation = mark_transition(Observation::from_outcome(target.id, outcome, now), previous);
        let observation = self.registry.append_observation(&observation).await?;

        debug!(
            target_id = target.id,
            status = %observation.status,
            latency_ms = observation.latency_ms,
            "Recorded observation"
        );

        if !observation.is_transition() {
            return Ok(CheckReport { observation, notifications: None });
        }

        let previous_status = previous.map(|p| p.status);
        match observation.status {
            SiteStatus::Down => warn!(
                target_id = target.id,
                url = %target.url,
                previous = ?previous_status,
                error = observation.error_message.as_deref().unwrap_or_default(),
                "Site went down"
            ),
            SiteStatus::Up => info!(
                target_id = target.id,
                url = %target.url,
                previous = ?previous_status,
                latency_ms = observation.latency_ms,
                "Site is up"
            ),
        }

        // The observation is already stored; sink lookup or delivery trouble must not undo that
        let sinks = match self.registry.list_sinks().await {
            Ok(sinks) => sinks,
            Err(e) => {
                warn!(target_id = target.id, error = %e, "Could not load sinks, skipping status alert");
                return Ok(CheckReport { observation, notifications: Some(FanoutReport::default()) });
            }
        };

        let report = self.fanout.notify(target, &observation, previous_status, &sinks).await;
        Ok(CheckReport { observation, notifications: Some(report) })
    }
}
