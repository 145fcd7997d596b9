//! Completion polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::engine::{Engine, EngineJobHandle, EngineResult, EngineStatus};
use crate::metrics::ENGINE_POLLS;

/// How polling ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The engine finished the job.
    Completed(EngineResult),
    /// The engine failed the job, lost it, or could not be reached.
    Failed(String),
    /// The deadline passed. The engine job may still be running.
    TimedOut { elapsed: Duration },
    /// A shutdown was signalled.
    Cancelled,
}

/// Polls the engine for a job's status at a fixed interval.
pub struct CompletionPoller {
    engine: Arc<dyn Engine>,
    poll_interval: Duration,
    max_consecutive_errors: u32,
    lost_job_polls: u32,
}

impl CompletionPoller {
    pub fn new(engine: Arc<dyn Engine>, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
            max_consecutive_errors: 5,
            lost_job_polls: 5,
        }
    }

    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.max_consecutive_errors = max.max(1);
        self
    }

    pub fn with_lost_job_polls(mut self, polls: u32) -> Self {
        self.lost_job_polls = polls.max(1);
        self
    }

    /// Polls until a terminal status, the timeout, or cancellation.
    ///
    /// Each status request is bounded by the remaining time, so this returns
    /// within `timeout` plus one poll interval. Dropping the future abandons
    /// the in-flight request.
    pub async fn await_completion(
        &self,
        handle: &EngineJobHandle,
        timeout: Duration,
        cancel: &mut broadcast::Receiver<()>,
    ) -> PollOutcome {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut consecutive_errors = 0u32;
        let mut not_found_polls = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = cancelled(cancel) => return PollOutcome::Cancelled,
                _ = sleep_until(deadline) => {
                    return PollOutcome::TimedOut { elapsed: started.elapsed() };
                }
                _ = ticker.tick() => {}
            }

            ENGINE_POLLS.inc();
            let response = tokio::select! {
                biased;
                _ = cancelled(cancel) => return PollOutcome::Cancelled,
                response = timeout_at(deadline, self.engine.status(handle)) => response,
            };

            let status = match response {
                Err(_) => return PollOutcome::TimedOut { elapsed: started.elapsed() },
                Ok(Err(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Status request for {} failed ({}/{}): {}",
                        handle, consecutive_errors, self.max_consecutive_errors, e
                    );
                    if consecutive_errors >= self.max_consecutive_errors {
                        return PollOutcome::Failed(format!(
                            "engine status unavailable after {} consecutive errors: {}",
                            consecutive_errors, e
                        ));
                    }
                    continue;
                }
                Ok(Ok(status)) => status,
            };
            consecutive_errors = 0;

            match status {
                EngineStatus::Completed(result) => {
                    debug!("{} completed with {} output(s)", handle, result.outputs.len());
                    return PollOutcome::Completed(result);
                }
                EngineStatus::Failed(message) => return PollOutcome::Failed(message),
                EngineStatus::Pending => {
                    not_found_polls = 0;
                    debug!("{} still pending after {:?}", handle, started.elapsed());
                }
                EngineStatus::NotFound => {
                    not_found_polls += 1;
                    debug!(
                        "{} unknown to engine ({}/{})",
                        handle, not_found_polls, self.lost_job_polls
                    );
                    if not_found_polls >= self.lost_job_polls {
                        return PollOutcome::Failed(format!(
                            "engine lost track of job {} (absent from history and queue)",
                            handle
                        ));
                    }
                }
            }
        }
    }
}

/// Resolves when a shutdown is signalled. A closed channel never resolves.
async fn cancelled(rx: &mut broadcast::Receiver<()>) {
    loop {
        match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => return,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
