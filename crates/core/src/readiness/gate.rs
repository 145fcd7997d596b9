//! Readiness gate implementation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::engine::{Engine, EngineError};
use crate::metrics::READINESS_PROBES;

use super::config::ReadinessConfig;
use super::types::{ReadinessError, ReadinessState};

/// Blocks job acceptance until the engine answers its health endpoint.
pub struct ReadinessGate {
    engine: Arc<dyn Engine>,
    config: ReadinessConfig,
    state_tx: watch::Sender<ReadinessState>,
}

impl ReadinessGate {
    pub fn new(engine: Arc<dyn Engine>, config: ReadinessConfig) -> Self {
        let (state_tx, _) = watch::channel(ReadinessState::Starting);
        Self {
            engine,
            config,
            state_tx,
        }
    }

    /// Current state.
    pub fn state(&self) -> ReadinessState {
        self.state_tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state_tx.borrow().is_ready()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.state_tx.subscribe()
    }

    /// Waits until the gate is Ready, or returns the failure.
    pub async fn wait_ready(&self) -> Result<(), ReadinessError> {
        let mut rx = self.subscribe();
        Self::wait_terminal(&mut rx).await
    }

    /// Waits on a receiver until a terminal state.
    pub async fn wait_terminal(
        rx: &mut watch::Receiver<ReadinessState>,
    ) -> Result<(), ReadinessError> {
        let state = rx
            .wait_for(ReadinessState::is_terminal)
            .await
            .map_err(|_| ReadinessError::Closed)?
            .clone();

        match state {
            ReadinessState::Failed {
                attempts,
                last_error,
            } => Err(ReadinessError::Failed {
                attempts,
                last_error,
            }),
            _ => Ok(()),
        }
    }

    /// Probes the engine until it answers or the attempt budget is spent.
    ///
    /// Runs once. Calling it after a terminal state returns that outcome
    /// without probing again.
    pub async fn run(&self) -> Result<(), ReadinessError> {
        match self.state() {
            ReadinessState::Ready => return Ok(()),
            ReadinessState::Failed {
                attempts,
                last_error,
            } => {
                return Err(ReadinessError::Failed {
                    attempts,
                    last_error,
                })
            }
            _ => {}
        }

        let max_attempts = self.config.max_attempts.max(1);
        let interval = self.config.interval();
        info!(
            "Waiting for engine '{}' ({} attempts, {:?} apart)",
            self.engine.name(),
            max_attempts,
            interval
        );

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            self.state_tx
                .send_replace(ReadinessState::Probing { attempt });

            // A probe never outlives the spacing between probes
            let probe = tokio::time::timeout(interval, self.engine.health())
                .await
                .unwrap_or_else(|_| {
                    Err(EngineError::Unavailable(format!(
                        "health probe timed out after {:?}",
                        interval
                    )))
                });

            match probe {
                Ok(()) => {
                    READINESS_PROBES.with_label_values(&["success"]).inc();
                    info!("Engine ready after {} attempt(s)", attempt);
                    self.state_tx.send_replace(ReadinessState::Ready);
                    return Ok(());
                }
                Err(e) => {
                    READINESS_PROBES.with_label_values(&["failure"]).inc();
                    debug!("Readiness probe {}/{} failed: {}", attempt, max_attempts, e);
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        error!(
            "Engine not ready after {} attempts, last error: {}",
            max_attempts, last_error
        );
        self.state_tx.send_replace(ReadinessState::Failed {
            attempts: max_attempts,
            last_error: last_error.clone(),
        });
        Err(ReadinessError::Failed {
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;
    use std::time::Duration;

    fn gate(engine: Arc<MockEngine>, attempts: u32) -> ReadinessGate {
        ReadinessGate::new(
            engine,
            ReadinessConfig::new(attempts, Duration::from_secs(2)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_transient_failures() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_health_probes(3).await;
        let gate = gate(engine.clone(), 5);

        assert_eq!(gate.state(), ReadinessState::Starting);
        gate.run().await.unwrap();

        assert!(gate.is_ready());
        assert_eq!(engine.health_calls().await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_when_never_healthy() {
        let engine = Arc::new(MockEngine::new());
        engine.set_unhealthy().await;
        let gate = gate(engine.clone(), 4);
        let mut rx = gate.subscribe();

        let started = tokio::time::Instant::now();
        let err = gate.run().await.unwrap_err();

        assert!(matches!(err, ReadinessError::Failed { attempts: 4, .. }));
        assert_eq!(engine.health_calls().await, 4);
        // Three gaps between four probes.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
        assert!(matches!(
            *rx.borrow_and_update(),
            ReadinessState::Failed { attempts: 4, .. }
        ));
        assert!(!gate.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_observes_run() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_health_probes(2).await;
        let gate = Arc::new(gate(engine, 30));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait_ready().await })
        };
        gate.run().await.unwrap();

        waiter.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_reports_failure() {
        let engine = Arc::new(MockEngine::new());
        engine.set_unhealthy().await;
        let gate = Arc::new(gate(engine, 2));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait_ready().await })
        };
        let _ = gate.run().await;

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ReadinessError::Failed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probing_states_are_published() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_health_probes(1).await;
        let gate = Arc::new(gate(engine, 3));
        let mut rx = gate.subscribe();

        let runner = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.run().await })
        };

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            let terminal = state.is_terminal();
            seen.push(state);
            if terminal {
                break;
            }
        }
        runner.await.unwrap().unwrap();

        assert_eq!(seen.first(), Some(&ReadinessState::Probing { attempt: 1 }));
        assert_eq!(seen.last(), Some(&ReadinessState::Ready));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_health_check_is_cut_at_interval() {
        let engine = Arc::new(MockEngine::new());
        engine.set_latency(Duration::from_secs(3600)).await;
        let gate = gate(engine.clone(), 3);

        let started = tokio::time::Instant::now();
        let err = gate.run().await.unwrap_err();

        // Three probes of at most 2s each, two gaps of 2s.
        assert!(started.elapsed() <= Duration::from_secs(11));
        assert_eq!(engine.health_calls().await, 3);
        match err {
            ReadinessError::Failed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_is_one_shot() {
        let engine = Arc::new(MockEngine::new());
        let gate = gate(engine.clone(), 3);
        gate.run().await.unwrap();
        gate.run().await.unwrap();
        assert_eq!(engine.health_calls().await, 1);
    }
}
