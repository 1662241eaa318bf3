//! Application state shared across all handlers.

use std::sync::Arc;

use modelhub_converter::RequestOrchestrator;
use modelhub_core::config::AppConfig;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Conversion pipeline
    pub orchestrator: RequestOrchestrator,
}

impl AppState {
    /// Create state from a loaded configuration and an orchestrator.
    pub fn new(config: AppConfig, orchestrator: RequestOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }
}
