//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full router in-process with a mock engine and a mock
//! object store standing in for the generation engine and remote storage.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use graphrelay_core::{EngineError, EngineStatus};
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};

// =============================================================================
// Health and Config
// =============================================================================

#[tokio::test]
async fn test_ping_when_ready() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/ping").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_ping_before_gate_opens() {
    let fixture = TestFixture::with_config(TestConfig::not_ready()).await;
    let response = fixture.get("/ping").await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "starting");
}

#[tokio::test]
async fn test_health_probes_engine() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["engine"], "connected");
    assert_eq!(response.body["readiness"]["state"], "ready");
    assert_eq!(response.body["pending_jobs"], 0);
    assert_eq!(response.body["config_hash"], "0123456789abcdef");

    fixture.engine.set_unhealthy().await;
    let response = fixture.get("/health").await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "unhealthy");
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["engine"]["url"], "http://127.0.0.1:8188");
    assert_eq!(response.body["storage"]["profile_configured"], false);
    assert!(response.body["storage"].get("profile").is_none());
    assert_eq!(response.body["jobs"]["poll_interval_ms"], 10);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/ping").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("graphrelay_http_requests_total"));
    assert!(response.text.contains("graphrelay_engine_ready 1"));
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_invocation_completes_with_outputs() {
    let fixture = TestFixture::new().await;
    fixture.create_engine_output("r1.mp4", b"video");
    fixture
        .engine
        .complete_with(fixtures::engine_result(&["r1.mp4"]))
        .await;

    let response = fixture
        .post("/invocations", fixture.local_request("t1"))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["job_id"], "t1");
    assert_eq!(response.body["status"], "completed");
    let expected = format!("local:{}", fixture.out_dir().join("r1.mp4").display());
    assert_eq!(response.body["outputs"], json!([expected]));
    assert!(response.body["engine_job_id"].is_string());
    assert!(response.body.get("error").is_none());
    assert_eq!(
        std::fs::read(fixture.out_dir().join("r1.mp4")).unwrap(),
        b"video"
    );
}

#[tokio::test]
async fn test_versioned_jobs_route() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/jobs", fixture.local_request("t2"))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outputs"], json!([]));
    assert_eq!(fixture.engine.submit_calls().await, 1);
}

#[tokio::test]
async fn test_flat_request_fields_with_remote_storage() {
    let fixture = TestFixture::new().await;
    fixture.remote.put_object("in", "t3/a.wav", b"RIFF").await;
    fixture.remote.put_object("in", "t3/t.txt", b"hello").await;
    fixture.remote.put_object("in", "t3/i.png", b"PNG").await;
    fixture.create_engine_output("r3.mp4", b"video");
    fixture
        .engine
        .complete_with(fixtures::engine_result(&["r3.mp4"]))
        .await;

    let response = fixture
        .post(
            "/invocations",
            json!({
                "audio_s3": "s3://in/t3/a.wav",
                "transcript_s3": "s3://in/t3/t.txt",
                "image_s3": "s3://in/t3/i.png",
                "output_s3_bucket": "s3://results/t3"
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let output = response.body["outputs"][0].as_str().unwrap();
    assert!(output.starts_with("https://results.mock-s3.local/t3/r3.mp4"));
    assert_eq!(
        fixture.remote.object("results", "t3/r3.mp4").await.as_deref(),
        Some(&b"video"[..])
    );
    assert_eq!(fixture.remote.download_count().await, 3);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/invocations", "{not json").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status"], "failed");
    assert_eq!(response.body["error_kind"], "invalid_request");
    assert_eq!(fixture.engine.submit_calls().await, 0);
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/invocations",
            json!({
                "job_id": "t4",
                "inputs": {"audio": "/a.wav", "transcript": "/t.txt"},
                "destination": "/out"
            }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["job_id"], "t4");
    assert!(response.body["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_missing_input_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/invocations",
            json!({
                "job_id": "t5",
                "inputs": {
                    "audio": fixture.create_input("a.wav"),
                    "transcript": fixture.create_input("t.txt"),
                    "image": fixture.temp_dir.path().join("missing.png").display().to_string()
                },
                "destination": fixture.out_dir().display().to_string()
            }),
        )
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error_kind"], "not_found");
    assert_eq!(fixture.engine.submit_calls().await, 0);
}

#[tokio::test]
async fn test_unknown_template_is_not_found() {
    let fixture = TestFixture::new().await;
    let mut body = fixture.local_request("t6");
    body["template"] = json!("does_not_exist");

    let response = fixture.post("/invocations", body).await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error_kind"], "template_not_found");
}

#[tokio::test]
async fn test_job_timeout_is_gateway_timeout() {
    let fixture =
        TestFixture::with_config(TestConfig::with_job_timeout(Duration::from_secs(1))).await;
    fixture
        .engine
        .set_status_sequence(vec![Ok(EngineStatus::Pending)])
        .await;

    let response = fixture
        .post("/invocations", fixture.local_request("t7"))
        .await;

    assert_status!(response, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.body["status"], "timed_out");
    assert_eq!(response.body["outputs"], json!([]));
    assert!(response.body["engine_job_id"].is_string());
}

#[tokio::test]
async fn test_engine_failure_is_server_error() {
    let fixture = TestFixture::new().await;
    fixture
        .engine
        .set_status_sequence(vec![Ok(EngineStatus::Failed(
            "node 7: CUDA out of memory".to_string(),
        ))])
        .await;

    let response = fixture
        .post("/invocations", fixture.local_request("t8"))
        .await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["status"], "failed");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("CUDA out of memory"));
}

#[tokio::test]
async fn test_rejected_graph_is_server_error() {
    let fixture = TestFixture::new().await;
    fixture
        .engine
        .push_submit_error(EngineError::Rejected("invalid graph".to_string()))
        .await;

    let response = fixture
        .post("/invocations", fixture.local_request("t9"))
        .await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.get("engine_job_id").is_none());
}

#[tokio::test]
async fn test_jobs_refused_before_gate_opens() {
    let fixture = TestFixture::with_config(TestConfig::not_ready()).await;
    let response = fixture
        .post("/invocations", fixture.local_request("t10"))
        .await;

    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error_kind"], "engine_unavailable");
    assert_eq!(fixture.engine.submit_calls().await, 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/unknown").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
