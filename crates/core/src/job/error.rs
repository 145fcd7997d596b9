//! Error types for the job module.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::engine::EngineError;
use crate::graph::GraphError;

/// Errors that end a single job. None of them affect other jobs.
#[derive(Debug, Error)]
pub enum JobError {
    /// The request itself is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Too many jobs are already admitted.
    #[error("Too many pending jobs (limit {limit})")]
    Busy { limit: usize },

    /// An input reference does not resolve to anything.
    #[error("Input '{slot}' not found: {uri}")]
    InputNotFound { slot: String, uri: String },

    /// A transfer failed after exhausting its retries.
    #[error("Storage error: {0}")]
    Storage(ArtifactError),

    /// The template is missing or unusable.
    #[error(transparent)]
    Template(#[from] GraphError),

    /// The engine could not be reached within the retry budget.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine refused the graph.
    #[error("Engine rejected graph: {0}")]
    EngineRejected(String),

    /// The engine reported an execution error, or lost the job.
    #[error("Engine execution failed: {0}")]
    EngineFailed(String),

    /// No terminal status within the job timeout.
    #[error("Job timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    /// A declared output is not on disk.
    #[error("Declared output missing: {path}")]
    OutputMissing { path: PathBuf },

    /// The service is shutting down.
    #[error("Job cancelled")]
    Cancelled,
}

/// Machine-readable failure category, returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    InvalidRequest,
    Busy,
    NotFound,
    Storage,
    TemplateNotFound,
    TemplateSlotMissing,
    TemplateInvalid,
    EngineUnavailable,
    EngineRejected,
    EngineFailed,
    TimedOut,
    OutputMissing,
    Cancelled,
}

impl JobError {
    pub fn kind(&self) -> JobErrorKind {
        match self {
            Self::InvalidRequest(_) => JobErrorKind::InvalidRequest,
            Self::Busy { .. } => JobErrorKind::Busy,
            Self::InputNotFound { .. } => JobErrorKind::NotFound,
            Self::Storage(_) => JobErrorKind::Storage,
            Self::Template(GraphError::TemplateNotFound { .. }) => JobErrorKind::TemplateNotFound,
            Self::Template(GraphError::TemplateSlotMissing { .. }) => {
                JobErrorKind::TemplateSlotMissing
            }
            Self::Template(_) => JobErrorKind::TemplateInvalid,
            Self::EngineUnavailable(_) => JobErrorKind::EngineUnavailable,
            Self::EngineRejected(_) => JobErrorKind::EngineRejected,
            Self::EngineFailed(_) => JobErrorKind::EngineFailed,
            Self::TimedOut { .. } => JobErrorKind::TimedOut,
            Self::OutputMissing { .. } => JobErrorKind::OutputMissing,
            Self::Cancelled => JobErrorKind::Cancelled,
        }
    }

    /// Maps an input resolution failure for `slot`.
    pub fn from_input(slot: &str, uri: &str, err: ArtifactError) -> Self {
        if err.is_not_found() {
            Self::InputNotFound {
                slot: slot.to_string(),
                uri: uri.to_string(),
            }
        } else {
            Self::Storage(err)
        }
    }
}

impl From<EngineError> for JobError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable(msg) => Self::EngineUnavailable(msg),
            EngineError::Rejected(msg) | EngineError::Protocol(msg) => Self::EngineRejected(msg),
            EngineError::Launch(msg) => Self::EngineUnavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_mapping() {
        let err = JobError::from_input("audio", "s3://b/a.wav", ArtifactError::not_found("s3://b/a.wav"));
        assert_eq!(err.kind(), JobErrorKind::NotFound);

        let err = JobError::from_input(
            "audio",
            "s3://b/a.wav",
            ArtifactError::transfer_failed("download", "s3://b/a.wav", "reset"),
        );
        assert_eq!(err.kind(), JobErrorKind::Storage);
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: JobError = EngineError::Protocol("no prompt_id".to_string()).into();
        assert_eq!(err.kind(), JobErrorKind::EngineRejected);

        let err: JobError = EngineError::Unavailable("refused".to_string()).into();
        assert_eq!(err.kind(), JobErrorKind::EngineUnavailable);
    }

    #[test]
    fn test_template_kinds() {
        let err: JobError = GraphError::TemplateSlotMissing {
            template: "t".to_string(),
            slot: "image".to_string(),
            input: "image".to_string(),
        }
        .into();
        assert_eq!(err.kind(), JobErrorKind::TemplateSlotMissing);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&JobErrorKind::EngineUnavailable).unwrap(),
            "\"engine_unavailable\""
        );
    }
}
