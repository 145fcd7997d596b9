//! Readiness states and errors.

use serde::Serialize;
use thiserror::Error;

/// Startup state of the engine connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReadinessState {
    /// Probing has not begun.
    Starting,
    /// Probe `attempt` (1-based) is in progress or waiting.
    Probing { attempt: u32 },
    /// The engine answered. Jobs may be accepted.
    Ready,
    /// The engine never answered within the attempt budget.
    Failed { attempts: u32, last_error: String },
}

impl ReadinessState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed { .. })
    }

    /// Short name for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Probing { .. } => "probing",
            Self::Ready => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Errors reported by the readiness gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadinessError {
    /// The engine did not become healthy. Fatal for the process.
    #[error("Engine not ready after {attempts} attempts: {last_error}")]
    Failed { attempts: u32, last_error: String },

    /// The gate was dropped before reaching a terminal state.
    #[error("Readiness gate closed before the engine became ready")]
    Closed,
}
