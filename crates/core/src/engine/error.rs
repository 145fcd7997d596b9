//! Error types for the engine module.

use thiserror::Error;

use crate::retry::Retryable;

/// Errors returned by an engine client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// The engine could not be reached or answered with a server error.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// The engine refused the request (structurally invalid graph).
    #[error("Engine rejected request: {0}")]
    Rejected(String),

    /// The engine answered with something we cannot interpret.
    #[error("Unexpected engine response: {0}")]
    Protocol(String),

    /// The engine process could not be started.
    #[error("Failed to launch engine: {0}")]
    Launch(String),
}

impl EngineError {
    /// Maps a transport error from reqwest.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unavailable(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::Unavailable(format!("connection failed: {}", err))
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

impl Retryable for EngineError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
