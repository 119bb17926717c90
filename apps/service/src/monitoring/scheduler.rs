use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::executor::MonitoringExecutor;
use crate::config::SchedulerSettings;
use crate::database::{Observation, Registry, Target};
use crate::shutdown::ShutdownSignal;

/// Whether `target` should be checked at `now`, given its latest observation
pub fn is_due(target: &Target, previous: Option<&Observation>, now: DateTime<Utc>) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            // An interval too long to represent never elapses
            let Some(interval) = i64::try_from(target.check_interval_seconds)
                .ok()
                .and_then(chrono::Duration::try_seconds)
            else {
                return false;
            };
            now.signed_duration_since(previous.checked_at) >= interval
        }
    }
}

/// Counters for one pass over all targets
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub targets: usize,
    pub checked: usize,
    pub not_due: usize,
    pub transitions: usize,
    pub failed: usize,
    /// Targets left alone because a stop was requested mid-tick
    pub stopped: usize,
}

enum TargetOutcome {
    NotDue,
    Checked { transitioned: bool },
    Stopped,
}

/// Monitoring scheduler - wakes on a fixed tick and checks every due target.
///
/// There is no per-target timer: a target is picked up by the first tick at
/// or after its interval has elapsed, so detection can lag by up to one tick.
pub struct MonitoringScheduler {
    registry: Arc<dyn Registry>,
    executor: Arc<MonitoringExecutor>,
    tick_interval: Duration,
    permits: Arc<Semaphore>,
    shutdown: ShutdownSignal,
}

impl MonitoringScheduler {
    pub fn new(
        registry: Arc<dyn Registry>,
        executor: Arc<MonitoringExecutor>,
        settings: &SchedulerSettings,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            registry,
            executor,
            tick_interval: settings.tick_interval(),
            permits: Arc::new(Semaphore::new(settings.max_concurrent_checks.max(1))),
            shutdown,
        }
    }

    /// Tick until the shutdown signal fires.
    ///
    /// A tick that is already running is allowed to finish; no new tick
    /// starts afterwards. Probes in flight are never interrupted.
    pub async fn run(mut self) {
        info!(tick_interval = ?self.tick_interval, "Monitoring scheduler started");

        let mut timer = interval(self.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.triggered() => break,
                _ = timer.tick() => {}
            }

            if self.shutdown.is_triggered() {
                break;
            }

            match self.tick().await {
                Ok(summary) => debug!(?summary, "Tick finished"),
                Err(e) => error!("Tick failed: {e:#}"),
            }
        }

        info!("Monitoring scheduler stopped");
    }

    pub async fn tick(&self) -> Result<TickSummary> {
        self.tick_at(Utc::now()).await
    }

    /// One pass over a snapshot of all targets, using `now` for due checks
    /// and as the check time of every new observation.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<TickSummary> {
        let targets = self.registry.list_targets().await.context("listing targets")?;
        let mut summary = TickSummary { targets: targets.len(), ..Default::default() };

        let mut tasks = JoinSet::new();
        for target in targets {
            if self.shutdown.is_triggered() {
                summary.stopped += 1;
                continue;
            }

            let registry = self.registry.clone();
            let executor = self.executor.clone();
            let permits = self.permits.clone();
            let shutdown = self.shutdown.clone();
            let target_id = target.id;

            tasks.spawn(async move {
                let outcome = check_if_due(registry, executor, permits, shutdown, target, now).await;
                (target_id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(TargetOutcome::NotDue))) => summary.not_due += 1,
                Ok((_, Ok(TargetOutcome::Stopped))) => summary.stopped += 1,
                Ok((_, Ok(TargetOutcome::Checked { transitioned }))) => {
                    summary.checked += 1;
                    if transitioned {
                        summary.transitions += 1;
                    }
                }
                Ok((target_id, Err(e))) => {
                    summary.failed += 1;
                    error!(target_id, "Check failed: {e:#}");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Check task aborted: {e}");
                }
            }
        }

        Ok(summary)
    }
}

/// The per-target unit of work; everything that can go wrong stays in here
async fn check_if_due(
    registry: Arc<dyn Registry>,
    executor: Arc<MonitoringExecutor>,
    permits: Arc<Semaphore>,
    shutdown: ShutdownSignal,
    target: Target,
    now: DateTime<Utc>,
) -> Result<TargetOutcome> {
    let previous = registry
        .latest_observation(target.id)
        .await
        .context("loading latest observation")?;

    if !is_due(&target, previous.as_ref(), now) {
        return Ok(TargetOutcome::NotDue);
    }

    let _permit = permits.acquire_owned().await.context("check limiter closed")?;

    if shutdown.is_triggered() {
        warn!(target_id = target.id, "Shutdown requested, not starting check");
        return Ok(TargetOutcome::Stopped);
    }

    let report = executor
        .execute_check(&target, previous.as_ref(), now)
        .await
        .context("storing observation")?;

    Ok(TargetOutcome::Checked { transitioned: report.transitioned() })
}
