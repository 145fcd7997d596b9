use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use graphrelay_core::{ReadinessState, SanitizedConfig};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct PingResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
    pub readiness: ReadinessState,
    pub pending_jobs: usize,
    pub config_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Container health check: 200 once the readiness gate has opened.
pub async fn ping(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.gate().state();
    let status = if readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(PingResponse {
            status: readiness.as_str().to_string(),
        }),
    )
}

/// Probes the engine live and reports the readiness state.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = state.engine().health().await;

    let (status, engine, error) = match probe {
        Ok(()) => (StatusCode::OK, "connected", None),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unreachable", Some(e.to_string())),
    };

    let body = HealthResponse {
        status: if status.is_success() { "healthy" } else { "unhealthy" }.to_string(),
        engine: engine.to_string(),
        readiness: state.gate().state(),
        pending_jobs: state.runner().pending_jobs(),
        config_hash: state.config_hash().to_string(),
        error,
        timestamp: Utc::now().to_rfc3339(),
    };
    (status, Json(body))
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
