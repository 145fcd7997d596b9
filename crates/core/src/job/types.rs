//! Job request and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRef;
use crate::engine::EngineJobHandle;

use super::error::{JobError, JobErrorKind};

/// References to the three inputs of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInputs {
    pub audio: ArtifactRef,
    pub transcript: ArtifactRef,
    pub image: ArtifactRef,
}

/// A job as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: String,
    pub inputs: JobInputs,
    /// Prefix the outputs are published under.
    pub destination: ArtifactRef,
    /// Template name. The library default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl JobRequest {
    /// Creates a request with a generated job id.
    pub fn new(inputs: JobInputs, destination: ArtifactRef) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            inputs,
            destination,
            template: None,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// Terminal status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Outcome of a job, returned to the caller and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    /// Published output references, in node order.
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_job_id: Option<EngineJobHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<JobErrorKind>,
    pub finished_at: DateTime<Utc>,
}

impl JobResult {
    pub fn completed(
        job_id: impl Into<String>,
        engine_job_id: EngineJobHandle,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Completed,
            outputs,
            engine_job_id: Some(engine_job_id),
            error: None,
            error_kind: None,
            finished_at: Utc::now(),
        }
    }

    /// A failed or timed-out result. Timeouts keep their own status.
    pub fn from_error(
        job_id: impl Into<String>,
        engine_job_id: Option<EngineJobHandle>,
        error: &JobError,
    ) -> Self {
        let kind = error.kind();
        let status = if kind == JobErrorKind::TimedOut {
            JobStatus::TimedOut
        } else {
            JobStatus::Failed
        };

        Self {
            job_id: job_id.into(),
            status,
            outputs: Vec::new(),
            engine_job_id,
            error: Some(error.to_string()),
            error_kind: Some(kind),
            finished_at: Utc::now(),
        }
    }
}
