//! Job API handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use graphrelay_core::{
    ArtifactRef, JobError, JobErrorKind, JobInputs, JobRequest, JobResult, JobStatus,
};
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Request body for running a job.
///
/// Inputs may be given as an `inputs` object or with the flat field names
/// older callers send (`audio_s3`, `transcript_s3`, `image_s3`,
/// `output_s3_bucket`).
#[derive(Debug, Default, Deserialize)]
pub struct JobRequestBody {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub inputs: Option<JobInputsBody>,
    #[serde(default, alias = "output_s3_bucket")]
    pub destination: Option<String>,
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub audio_s3: Option<String>,
    #[serde(default)]
    pub transcript_s3: Option<String>,
    #[serde(default)]
    pub image_s3: Option<String>,
}

/// Input references in request body
#[derive(Debug, Default, Deserialize)]
pub struct JobInputsBody {
    pub audio: Option<String>,
    pub transcript: Option<String>,
    pub image: Option<String>,
}

impl JobRequestBody {
    /// Validates the body and builds a job request.
    pub fn into_request(self) -> Result<JobRequest, JobError> {
        let inputs = self.inputs.unwrap_or_default();
        let audio = parse_field("audio", inputs.audio.or(self.audio_s3))?;
        let transcript = parse_field("transcript", inputs.transcript.or(self.transcript_s3))?;
        let image = parse_field("image", inputs.image.or(self.image_s3))?;
        let destination = parse_field("destination", self.destination)?;

        let mut request = JobRequest::new(
            JobInputs {
                audio,
                transcript,
                image,
            },
            destination,
        );
        if let Some(job_id) = self.job_id.filter(|id| !id.trim().is_empty()) {
            request = request.with_job_id(job_id);
        }
        if let Some(template) = self.template.filter(|t| !t.trim().is_empty()) {
            request = request.with_template(template);
        }
        Ok(request)
    }
}

fn parse_field(field: &str, value: Option<String>) -> Result<ArtifactRef, JobError> {
    let value =
        value.ok_or_else(|| JobError::InvalidRequest(format!("missing required field: {}", field)))?;
    ArtifactRef::parse(&value)
        .map_err(|e| JobError::InvalidRequest(format!("field '{}': {}", field, e)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Runs a job to completion and returns its result.
///
/// Served at both `/invocations` and `/api/v1/jobs`.
pub async fn run_job(
    State(state): State<Arc<AppState>>,
    body: Result<Json<JobRequestBody>, JsonRejection>,
) -> (StatusCode, Json<JobResult>) {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return failure(None, JobError::InvalidRequest(rejection.body_text()));
        }
    };

    let job_id = body.job_id.clone();
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return failure(job_id, e),
    };

    if !state.gate().is_ready() {
        return failure(
            Some(request.job_id),
            JobError::EngineUnavailable(format!("engine is {}", state.gate().state().as_str())),
        );
    }

    info!(
        "Received job {} (template: {})",
        request.job_id,
        request.template.as_deref().unwrap_or("default")
    );
    let result = state.runner().run(request).await;
    (status_code(&result), Json(result))
}

fn failure(job_id: Option<String>, error: JobError) -> (StatusCode, Json<JobResult>) {
    let job_id = job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let result = JobResult::from_error(job_id, None, &error);
    (status_code(&result), Json(result))
}

/// HTTP status for a job result.
pub fn status_code(result: &JobResult) -> StatusCode {
    match (result.status, result.error_kind) {
        (JobStatus::Completed, _) => StatusCode::OK,
        (JobStatus::TimedOut, _) => StatusCode::GATEWAY_TIMEOUT,
        (_, Some(JobErrorKind::InvalidRequest)) => StatusCode::BAD_REQUEST,
        (_, Some(JobErrorKind::NotFound)) | (_, Some(JobErrorKind::TemplateNotFound)) => {
            StatusCode::NOT_FOUND
        }
        (_, Some(JobErrorKind::Busy))
        | (_, Some(JobErrorKind::EngineUnavailable))
        | (_, Some(JobErrorKind::Cancelled)) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
