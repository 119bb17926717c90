use std::sync::Arc;

use sitewatch_service::database::Registry;

/// Shared by every worker; the scheduler holds its own handle to the registry
pub struct AppState {
    pub registry: Arc<dyn Registry>,
    /// Used to warn about intervals the scheduler cannot honour
    pub tick_seconds: u64,
}

impl AppState {
    pub fn new(registry: Arc<dyn Registry>, tick_seconds: u64) -> Self {
        Self { registry, tick_seconds }
    }
}
