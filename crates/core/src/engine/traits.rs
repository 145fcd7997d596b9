//! Trait definitions for the engine module.

use async_trait::async_trait;

use crate::graph::GraphInstance;

use super::error::EngineError;
use super::types::{EngineJobHandle, EngineStatus};

/// A generation engine that executes processing graphs.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Probes the engine's control endpoint.
    async fn health(&self) -> Result<(), EngineError>;

    /// Submits a graph for execution.
    async fn submit(&self, graph: &GraphInstance) -> Result<EngineJobHandle, EngineError>;

    /// Reports the current status of a submitted graph.
    async fn status(&self, handle: &EngineJobHandle) -> Result<EngineStatus, EngineError>;
}
