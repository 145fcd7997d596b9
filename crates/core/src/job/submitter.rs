//! Graph submission with retry.

use std::sync::Arc;

use tracing::info;

use crate::engine::{Engine, EngineError, EngineJobHandle};
use crate::graph::GraphInstance;
use crate::metrics::ENGINE_SUBMISSIONS;
use crate::retry::{retry_async, RetryConfig};

use super::error::JobError;

/// Sends parameterized graphs to the engine.
pub struct JobSubmitter {
    engine: Arc<dyn Engine>,
    retry: RetryConfig,
}

impl JobSubmitter {
    pub fn new(engine: Arc<dyn Engine>, retry: RetryConfig) -> Self {
        Self { engine, retry }
    }

    /// Submits a graph and returns the engine's handle.
    ///
    /// An unavailable engine is retried within the budget. A rejection is
    /// returned immediately.
    pub async fn submit(&self, graph: &GraphInstance) -> Result<EngineJobHandle, JobError> {
        let result = retry_async(&self.retry, "submit", |_| self.engine.submit(graph)).await;

        let label = match &result {
            Ok(_) => "accepted",
            Err(EngineError::Unavailable(_)) | Err(EngineError::Launch(_)) => "unavailable",
            Err(_) => "rejected",
        };
        ENGINE_SUBMISSIONS.with_label_values(&[label]).inc();

        let handle = result?;
        info!("Submitted graph to {} as {}", self.engine.name(), handle);
        Ok(handle)
    }
}
