use std::sync::Arc;

use graphrelay_core::{Config, Engine, JobRunner, ReadinessGate, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    config_hash: String,
    runner: Arc<JobRunner>,
    gate: Arc<ReadinessGate>,
    engine: Arc<dyn Engine>,
}

impl AppState {
    pub fn new(
        config: Config,
        config_hash: impl Into<String>,
        runner: Arc<JobRunner>,
        gate: Arc<ReadinessGate>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        Self {
            config,
            config_hash: config_hash.into(),
            runner,
            gate,
            engine,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Short fingerprint of the loaded configuration.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn runner(&self) -> &JobRunner {
        self.runner.as_ref()
    }

    pub fn gate(&self) -> &ReadinessGate {
        self.gate.as_ref()
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }
}
