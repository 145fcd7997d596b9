//! Mock engine for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{Engine, EngineError, EngineJobHandle, EngineResult, EngineStatus};
use crate::graph::GraphInstance;

#[derive(Debug, Default)]
struct Concurrency {
    active: usize,
    max_active: usize,
}

/// Mock implementation of the Engine trait.
///
/// Provides controllable behavior for testing:
/// - Fail the first N health probes, or all of them
/// - Fail submissions with scripted errors
/// - Script the status answers returned while polling
/// - Record submitted graphs for assertions
/// - Track how many jobs were active on the engine at once
///
/// # Example
///
/// ```rust,ignore
/// use graphrelay_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.fail_health_probes(3).await;
/// engine
///     .set_status_sequence(vec![
///         Ok(EngineStatus::Pending),
///         Ok(EngineStatus::Completed(result)),
///     ])
///     .await;
/// ```
#[derive(Debug)]
pub struct MockEngine {
    /// Remaining health probes that fail. `None` means every probe fails.
    failing_health_probes: Arc<RwLock<Option<u32>>>,
    health_calls: Arc<RwLock<u32>>,
    /// Errors returned by the next submissions, in order.
    submit_errors: Arc<RwLock<VecDeque<EngineError>>>,
    submitted: Arc<RwLock<Vec<GraphInstance>>>,
    submit_calls: Arc<RwLock<u32>>,
    /// Status answers, consumed per poll. The last one repeats.
    status_sequence: Arc<RwLock<VecDeque<Result<EngineStatus, EngineError>>>>,
    status_calls: Arc<RwLock<u32>>,
    latency: Arc<RwLock<Duration>>,
    concurrency: Arc<RwLock<Concurrency>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a healthy engine that completes every job with no outputs.
    pub fn new() -> Self {
        let mut sequence = VecDeque::new();
        sequence.push_back(Ok(EngineStatus::Completed(EngineResult::default())));

        Self {
            failing_health_probes: Arc::new(RwLock::new(Some(0))),
            health_calls: Arc::new(RwLock::new(0)),
            submit_errors: Arc::new(RwLock::new(VecDeque::new())),
            submitted: Arc::new(RwLock::new(Vec::new())),
            submit_calls: Arc::new(RwLock::new(0)),
            status_sequence: Arc::new(RwLock::new(sequence)),
            status_calls: Arc::new(RwLock::new(0)),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            concurrency: Arc::new(RwLock::new(Concurrency::default())),
        }
    }

    /// Fail the next `count` health probes, then succeed.
    pub async fn fail_health_probes(&self, count: u32) {
        *self.failing_health_probes.write().await = Some(count);
    }

    /// Fail every health probe.
    pub async fn set_unhealthy(&self) {
        *self.failing_health_probes.write().await = None;
    }

    /// Queue errors for the next submissions.
    pub async fn push_submit_error(&self, error: EngineError) {
        self.submit_errors.write().await.push_back(error);
    }

    /// Replace the scripted status answers. The last entry repeats forever.
    pub async fn set_status_sequence(&self, sequence: Vec<Result<EngineStatus, EngineError>>) {
        *self.status_sequence.write().await = sequence.into();
    }

    /// Complete every job with `result`.
    pub async fn complete_with(&self, result: EngineResult) {
        self.set_status_sequence(vec![Ok(EngineStatus::Completed(result))])
            .await;
    }

    /// Delay every call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    pub async fn health_calls(&self) -> u32 {
        *self.health_calls.read().await
    }

    pub async fn submit_calls(&self) -> u32 {
        *self.submit_calls.read().await
    }

    pub async fn status_calls(&self) -> u32 {
        *self.status_calls.read().await
    }

    /// Graphs accepted so far.
    pub async fn submitted(&self) -> Vec<GraphInstance> {
        self.submitted.read().await.clone()
    }

    /// Highest number of jobs that were submitted but not yet terminal.
    pub async fn max_concurrent_jobs(&self) -> usize {
        self.concurrency.read().await.max_active
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    async fn next_status(&self) -> Result<EngineStatus, EngineError> {
        let mut sequence = self.status_sequence.write().await;
        if sequence.len() > 1 {
            sequence
                .pop_front()
                .unwrap_or(Ok(EngineStatus::Pending))
        } else {
            sequence.front().cloned().unwrap_or(Ok(EngineStatus::Pending))
        }
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health(&self) -> Result<(), EngineError> {
        *self.health_calls.write().await += 1;
        self.simulate_latency().await;

        let mut failing = self.failing_health_probes.write().await;
        match failing.as_mut() {
            None => Err(EngineError::Unavailable("connection refused".to_string())),
            Some(0) => Ok(()),
            Some(remaining) => {
                *remaining -= 1;
                Err(EngineError::Unavailable("connection refused".to_string()))
            }
        }
    }

    async fn submit(&self, graph: &GraphInstance) -> Result<EngineJobHandle, EngineError> {
        let calls = {
            let mut calls = self.submit_calls.write().await;
            *calls += 1;
            *calls
        };
        self.simulate_latency().await;

        if let Some(err) = self.submit_errors.write().await.pop_front() {
            return Err(err);
        }

        self.submitted.write().await.push(graph.clone());
        let mut concurrency = self.concurrency.write().await;
        concurrency.active += 1;
        concurrency.max_active = concurrency.max_active.max(concurrency.active);

        Ok(EngineJobHandle::new(format!("mock-prompt-{}", calls)))
    }

    async fn status(&self, _handle: &EngineJobHandle) -> Result<EngineStatus, EngineError> {
        *self.status_calls.write().await += 1;
        self.simulate_latency().await;

        let status = self.next_status().await;
        if matches!(status, Ok(ref s) if s.is_terminal()) {
            let mut concurrency = self.concurrency.write().await;
            concurrency.active = concurrency.active.saturating_sub(1);
        }
        status
    }
}
