//! Startup tests for the `graphrelay` binary.
//!
//! Each test spawns the real binary against a small in-process HTTP server
//! that answers the engine endpoints.

use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use axum::{extract::Path as UrlPath, routing::get, routing::post, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

use graphrelay_core::testing::fixtures;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Start a fake engine that accepts every graph as `p1` and reports it
/// finished with a single image.
async fn spawn_fake_engine() -> u16 {
    let app = Router::new()
        .route("/system_stats", get(|| async { Json(json!({"system": {}})) }))
        .route(
            "/prompt",
            post(|Json(_body): Json<Value>| async { Json(json!({"prompt_id": "p1"})) }),
        )
        .route(
            "/history/{id}",
            get(|UrlPath(id): UrlPath<String>| async move {
                let mut history = serde_json::Map::new();
                history.insert(
                    id,
                    json!({
                        "outputs": {
                            "9": {"images": [{"filename": "r1.png", "subfolder": "", "type": "output"}]}
                        },
                        "status": {"status_str": "success", "completed": true, "messages": []}
                    }),
                );
                Json(Value::Object(history))
            }),
        )
        .route(
            "/queue",
            get(|| async { Json(json!({"queue_running": [], "queue_pending": []})) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Write a config pointing at `engine_port` with all paths inside `dir`.
fn write_config(dir: &Path, port: u16, engine_port: u16) -> std::path::PathBuf {
    let workflows = dir.join("workflows");
    std::fs::create_dir_all(&workflows).unwrap();
    std::fs::write(workflows.join("default.json"), fixtures::TEMPLATE_JSON).unwrap();
    std::fs::create_dir_all(dir.join("engine-output")).unwrap();

    let config = format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[engine]
url = "http://127.0.0.1:{engine_port}"
request_timeout_secs = 2
output_dir = '{output}'

[storage]
cache_dir = '{cache}'

[storage.remote]
enabled = false

[readiness]
max_attempts = 20
interval_ms = 50

[jobs]
poll_interval_ms = 20
timeout_secs = 10

[graph]
template_dir = '{workflows}'
"#,
        port = port,
        engine_port = engine_port,
        output = dir.join("engine-output").display(),
        cache = dir.join("cache").display(),
        workflows = workflows.display(),
    );

    let path = dir.join("config.toml");
    std::fs::write(&path, config).unwrap();
    path
}

/// Append raw TOML to a config written by `write_config`.
fn append_config(path: &Path, extra: &str) {
    let mut config = std::fs::read_to_string(path).unwrap();
    config.push_str(extra);
    std::fs::write(path, config).unwrap();
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_graphrelay"))
        .env("GRAPHRELAY_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for /ping to answer 200
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if let Ok(response) = client
            .get(format!("http://127.0.0.1:{}/ping", port))
            .send()
            .await
        {
            if response.status().is_success() {
                return true;
            }
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_job_round_trip_against_engine() {
    let temp_dir = TempDir::new().unwrap();
    let engine_port = spawn_fake_engine().await;
    let port = get_available_port();
    let config_path = write_config(temp_dir.path(), port, engine_port);

    let inputs = temp_dir.path().join("in");
    std::fs::create_dir_all(&inputs).unwrap();
    for name in ["a.wav", "t.txt", "i.png"] {
        std::fs::write(inputs.join(name), name).unwrap();
    }
    std::fs::write(temp_dir.path().join("engine-output/r1.png"), b"png").unwrap();

    let mut server = spawn_server(&config_path);
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let out_dir = temp_dir.path().join("out");
    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/invocations", port))
        .json(&json!({
            "job_id": "t1",
            "inputs": {
                "audio": inputs.join("a.wav").display().to_string(),
                "transcript": inputs.join("t.txt").display().to_string(),
                "image": inputs.join("i.png").display().to_string()
            },
            "destination": out_dir.display().to_string()
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["engine_job_id"], "p1");
    assert_eq!(
        body["outputs"],
        json!([format!("local:{}", out_dir.join("r1.png").display())])
    );
    assert_eq!(std::fs::read(out_dir.join("r1.png")).unwrap(), b"png");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let temp_dir = TempDir::new().unwrap();
    let engine_port = spawn_fake_engine().await;
    let port = get_available_port();
    let config_path = write_config(temp_dir.path(), port, engine_port);

    let mut server = spawn_server(&config_path);
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let json: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["storage"]["remote_enabled"], false);
    assert!(json["storage"].get("remote").is_none());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_unreachable_engine_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();
    let port = get_available_port();
    // Nothing listens on this port
    let engine_port = get_available_port();
    let config_path = write_config(temp_dir.path(), port, engine_port);

    let mut server = spawn_server(&config_path);
    let status = timeout(Duration::from_secs(20), server.wait())
        .await
        .expect("Server should exit after readiness fails")
        .expect("Failed to wait for server");

    assert!(!status.success());
    assert!(Client::new()
        .get(format!("http://127.0.0.1:{}/ping", port))
        .send()
        .await
        .is_err());
}

#[tokio::test]
async fn test_missing_config_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut server = spawn_server(&temp_dir.path().join("nope.toml"));

    let status = timeout(Duration::from_secs(10), server.wait())
        .await
        .expect("Server should exit")
        .expect("Failed to wait for server");
    assert!(!status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();
    let engine_port = spawn_fake_engine().await;
    let config_path = write_config(temp_dir.path(), 0, engine_port);

    let mut server = spawn_server(&config_path);
    let status = timeout(Duration::from_secs(10), server.wait())
        .await
        .expect("Server should exit")
        .expect("Failed to wait for server");
    assert!(!status.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_owned_engine_is_stopped_when_readiness_fails() {
    let temp_dir = TempDir::new().unwrap();
    let port = get_available_port();
    // The launched "engine" never listens, so readiness fails
    let engine_port = get_available_port();
    let config_path = write_config(temp_dir.path(), port, engine_port);
    let pid_file = temp_dir.path().join("engine.pid");
    append_config(
        &config_path,
        &format!(
            r#"
[engine.launch]
program = "sh"
args = ["-c", 'echo $$ > "{pid}"; exec sleep 30']
stop_timeout_secs = 5
"#,
            pid = pid_file.display(),
        ),
    );

    let mut server = spawn_server(&config_path);
    let status = timeout(Duration::from_secs(20), server.wait())
        .await
        .expect("Server should exit after readiness fails")
        .expect("Failed to wait for server");
    assert!(!status.success());

    let mut pid = String::new();
    for _ in 0..40 {
        if let Ok(contents) = std::fs::read_to_string(&pid_file) {
            if !contents.trim().is_empty() {
                pid = contents.trim().to_string();
                break;
            }
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert!(!pid.is_empty(), "Engine process never started");

    let alive = std::process::Command::new("kill")
        .args(["-0", &pid])
        .stderr(std::process::Stdio::null())
        .status()
        .expect("Failed to run kill")
        .success();
    assert!(!alive, "Engine process {} outlived the server", pid);
}
