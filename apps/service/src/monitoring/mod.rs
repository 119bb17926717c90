/// Monitoring engine module
///
/// This module is responsible for:
/// - Probing targets over HTTP
/// - Detecting up/down transitions
/// - Driving the periodic due-check loop
pub mod executor;
pub mod prober;
pub mod scheduler;
pub mod transition;
pub mod types;

pub use executor::{CheckReport, MonitoringExecutor};
pub use prober::{HttpProber, Prober};
pub use scheduler::{MonitoringScheduler, TickSummary, is_due};
pub use types::{ProbeOutcome, SiteStatus};
