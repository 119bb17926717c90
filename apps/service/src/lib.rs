//! sitewatch - HTTP uptime monitoring.
//!
//! Targets are probed on a coarse, fixed tick. Every probe is stored as an
//! immutable observation and every up/down change is pushed to the
//! registered webhooks exactly once.

pub mod config;
pub mod database;
pub mod monitoring;
pub mod notifications;
pub mod pool;
pub mod shutdown;
pub mod validation;

use std::sync::Arc;

use anyhow::Result;

use config::Config;
use database::{LibsqlRegistry, Registry};
use monitoring::{HttpProber, MonitoringExecutor, MonitoringScheduler};
use notifications::{NotificationFanout, WebhookNotifier};
use shutdown::ShutdownSignal;

/// Everything a binary needs: the shared registry and a ready-to-run scheduler
pub struct Service {
    pub registry: Arc<dyn Registry>,
    pub scheduler: MonitoringScheduler,
}

impl Service {
    /// Open the database and wire the HTTP prober and webhook notifier
    pub async fn build(config: &Config, shutdown: ShutdownSignal) -> Result<Self> {
        tracing::info!("Opening database at {}", config.database.path.display());
        let pool = pool::open_pool(&config.database.path, config.database.max_connections).await?;
        let registry: Arc<dyn Registry> = Arc::new(LibsqlRegistry::new_from_pool(pool));

        let prober = Arc::new(HttpProber::new(&config.probe)?);
        let notifier = Arc::new(WebhookNotifier::new(std::time::Duration::from_secs(
            config.notifications.timeout_seconds,
        ))?);
        let fanout = Arc::new(NotificationFanout::new(notifier));
        let executor = Arc::new(MonitoringExecutor::new(registry.clone(), prober, fanout));

        let scheduler = MonitoringScheduler::new(registry.clone(), executor, &config.scheduler, shutdown);

        Ok(Self { registry, scheduler })
    }
}
