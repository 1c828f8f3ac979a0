use restreamer_core::{Config, Orchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
