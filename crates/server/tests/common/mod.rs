//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with a mock engine and mock object store injected, so the job API can be
//! exercised end to end without an engine or remote storage.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use graphrelay_core::{
    testing::{MockEngine, MockObjectStore},
    ArtifactStore, Config, Engine, JobRunner, JobsConfig, ObjectStore, ReadinessConfig,
    ReadinessGate, RetryConfig, ServerConfig, StorageConfig, TemplateLibrary,
};
use graphrelay_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use graphrelay_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_invocation() {
///     let fixture = TestFixture::new().await;
///     fixture.engine.complete_with(fixtures::engine_result(&["r1.mp4"])).await;
///
///     let response = fixture.post("/invocations", fixture.local_request("t1")).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - script health, submissions and status answers
    pub engine: Arc<MockEngine>,
    /// Mock object store - seed inputs and inspect uploads
    pub remote: Arc<MockObjectStore>,
    /// Temporary directory for inputs, engine output and destinations
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture whose readiness gate has already opened.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let engine = Arc::new(MockEngine::new());
        let remote = Arc::new(MockObjectStore::new());

        let jobs = JobsConfig::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(test_config.job_timeout)
            .with_submit_retry(RetryConfig::no_retry());
        let storage = StorageConfig::default()
            .with_cache_dir(temp_dir.path().join("cache"))
            .with_retry(RetryConfig::no_retry());
        let output_root = temp_dir.path().join("engine-output");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            jobs: jobs.clone(),
            storage: storage.clone(),
            ..Default::default()
        };

        let store = ArtifactStore::new(
            storage,
            Some(Arc::clone(&remote) as Arc<dyn ObjectStore>),
        );
        let templates =
            TemplateLibrary::from_templates([fixtures::graph_template("default")], "default");

        let engine_dyn: Arc<dyn Engine> = Arc::clone(&engine) as Arc<dyn Engine>;
        let runner = Arc::new(JobRunner::new(
            jobs,
            Arc::clone(&engine_dyn),
            Arc::new(store),
            Arc::new(templates),
            output_root,
        ));

        let gate = Arc::new(ReadinessGate::new(
            Arc::clone(&engine_dyn),
            ReadinessConfig::new(3, Duration::from_millis(5)),
        ));
        if test_config.ready {
            gate.run().await.expect("Mock engine should become ready");
        }

        let state = Arc::new(AppState::new(
            config,
            "0123456789abcdef",
            runner,
            gate,
            engine_dyn,
        ));

        Self {
            router: create_router(state),
            engine,
            remote,
            temp_dir,
        }
    }

    /// Directory the engine writes its results into.
    pub fn engine_output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("engine-output")
    }

    /// Local destination directory for published outputs.
    pub fn out_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    /// Write a local input file and return its path as a string.
    pub fn create_input(&self, name: &str) -> String {
        let dir = self.temp_dir.path().join("in");
        std::fs::create_dir_all(&dir).expect("Failed to create input dir");
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).expect("Failed to write input");
        path.display().to_string()
    }

    /// Write a file as if the engine had produced it.
    pub fn create_engine_output(&self, name: &str, data: &[u8]) {
        let dir = self.engine_output_dir();
        std::fs::create_dir_all(&dir).expect("Failed to create engine output dir");
        std::fs::write(dir.join(name), data).expect("Failed to write engine output");
    }

    /// A request body with local inputs and a local destination.
    pub fn local_request(&self, job_id: &str) -> Value {
        serde_json::json!({
            "job_id": job_id,
            "inputs": {
                "audio": self.create_input("a.wav"),
                "transcript": self.create_input("t.txt"),
                "image": self.create_input("i.png"),
            },
            "destination": self.out_dir().display().to_string(),
        })
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    /// Send a request with raw string body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Run the readiness gate before building the router
    pub ready: bool,
    /// Time allowed for each job
    pub job_timeout: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            ready: true,
            job_timeout: Duration::from_secs(5),
        }
    }
}

impl TestConfig {
    /// Fixture whose gate never ran.
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Default::default()
        }
    }

    /// Fixture with a short job timeout.
    pub fn with_job_timeout(timeout: Duration) -> Self {
        Self {
            job_timeout: timeout,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
