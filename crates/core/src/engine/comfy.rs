//! HTTP client for a ComfyUI-compatible engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::graph::{compare_node_ids, GraphInstance, GraphNode};

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::Engine;
use super::types::{EngineJobHandle, EngineResult, EngineStatus, OutputArtifact, OutputKind};

/// Node output keys scanned for files, in reporting order.
const OUTPUT_KEYS: [&str; 4] = ["images", "gifs", "videos", "audio"];

#[derive(Serialize)]
struct PromptRequest<'a> {
    prompt: &'a std::collections::BTreeMap<String, GraphNode>,
    client_id: &'a str,
}

/// ComfyUI engine client.
pub struct ComfyClient {
    client: Client,
    config: EngineConfig,
    /// Identifies this process to the engine across submissions.
    client_id: String,
}

impl ComfyClient {
    /// Create a new engine client.
    pub fn new(config: EngineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn get_json(&self, endpoint: &str) -> Result<Value, EngineError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(EngineError::from_transport)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(EngineError::Unavailable(format!("HTTP {} from {}", status, endpoint)));
        }
        if !status.is_success() {
            return Err(EngineError::Protocol(format!("HTTP {} from {}", status, endpoint)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::Protocol(format!("invalid JSON from {}: {}", endpoint, e)))
    }

    /// Interprets a `/history/{id}` body. `None` when the handle is absent.
    fn parse_history(handle: &EngineJobHandle, body: &Value) -> Option<EngineStatus> {
        let entry = body.get(handle.as_str())?;
        let status = entry.get("status");

        let status_str = status
            .and_then(|s| s.get("status_str"))
            .and_then(Value::as_str);
        if status_str == Some("error") {
            let message = status
                .and_then(|s| s.get("messages"))
                .and_then(Self::execution_error_message)
                .unwrap_or_else(|| "engine reported an execution error".to_string());
            return Some(EngineStatus::Failed(message));
        }

        let completed = status.and_then(|s| s.get("completed")).and_then(Value::as_bool);
        if completed == Some(false) {
            return Some(EngineStatus::Pending);
        }

        match entry.get("outputs").and_then(Value::as_object) {
            Some(outputs) => Some(EngineStatus::Completed(Self::parse_outputs(outputs))),
            None => Some(EngineStatus::Pending),
        }
    }

    /// Flattens per-node outputs in node-id order.
    fn parse_outputs(outputs: &serde_json::Map<String, Value>) -> EngineResult {
        let mut node_ids: Vec<&String> = outputs.keys().collect();
        node_ids.sort_by(|a, b| compare_node_ids(a, b));

        let mut artifacts = Vec::new();
        for node_id in node_ids {
            let node = &outputs[node_id.as_str()];
            for key in OUTPUT_KEYS {
                let Some(kind) = OutputKind::from_output_key(key) else {
                    continue;
                };
                let Some(items) = node.get(key).and_then(Value::as_array) else {
                    continue;
                };
                for item in items {
                    let Some(filename) = item.get("filename").and_then(Value::as_str) else {
                        continue;
                    };
                    artifacts.push(OutputArtifact {
                        node_id: node_id.clone(),
                        kind,
                        filename: filename.to_string(),
                        subfolder: item
                            .get("subfolder")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        location_type: item
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or("output")
                            .to_string(),
                    });
                }
            }
        }

        EngineResult { outputs: artifacts }
    }

    /// Pulls the message out of an `["execution_error", {...}]` status entry.
    fn execution_error_message(messages: &Value) -> Option<String> {
        messages.as_array()?.iter().find_map(|message| {
            let pair = message.as_array()?;
            if pair.first()?.as_str()? != "execution_error" {
                return None;
            }
            let details = pair.get(1)?;
            let text = details.get("exception_message")?.as_str()?.trim();
            match details.get("node_id").and_then(Value::as_str) {
                Some(node) => Some(format!("node {}: {}", node, text)),
                None => Some(text.to_string()),
            }
        })
    }

    /// Whether `/queue` lists the handle as running or pending.
    fn queue_contains(handle: &EngineJobHandle, body: &Value) -> bool {
        ["queue_running", "queue_pending"].iter().any(|list| {
            body.get(*list)
                .and_then(Value::as_array)
                .map(|items| {
                    items.iter().any(|item| {
                        item.get(1).and_then(Value::as_str) == Some(handle.as_str())
                    })
                })
                .unwrap_or(false)
        })
    }

    /// Builds a readable reason from a 4xx `/prompt` body.
    fn rejection_reason(status: StatusCode, body: &str) -> String {
        let Ok(json) = serde_json::from_str::<Value>(body) else {
            let snippet: String = body.chars().take(200).collect();
            return format!("HTTP {}: {}", status, snippet);
        };

        let mut reason = match json.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(error) => error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("invalid graph")
                .to_string(),
            None => format!("HTTP {}", status),
        };

        if let Some(node_errors) = json.get("node_errors").and_then(Value::as_object) {
            if !node_errors.is_empty() {
                let mut nodes: Vec<&str> = node_errors.keys().map(String::as_str).collect();
                nodes.sort_by(|a, b| compare_node_ids(a, b));
                reason.push_str(&format!(" (nodes with errors: {})", nodes.join(", ")));
            }
        }
        reason
    }
}

#[async_trait]
impl Engine for ComfyClient {
    fn name(&self) -> &str {
        "comfyui"
    }

    async fn health(&self) -> Result<(), EngineError> {
        let url = format!("{}/system_stats", self.base_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(EngineError::from_transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::Unavailable(format!(
                "HTTP {} from /system_stats",
                response.status()
            )))
        }
    }

    async fn submit(&self, graph: &GraphInstance) -> Result<EngineJobHandle, EngineError> {
        let url = format!("{}/prompt", self.base_url());
        let body = PromptRequest {
            prompt: graph.nodes(),
            client_id: &self.client_id,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(EngineError::from_transport)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(EngineError::from_transport)?;

        if status.is_server_error() {
            return Err(EngineError::Unavailable(format!("HTTP {} from /prompt", status)));
        }
        if !status.is_success() {
            return Err(EngineError::Rejected(Self::rejection_reason(status, &text)));
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            EngineError::Rejected(format!("submission response is not JSON: {}", e))
        })?;
        let prompt_id = json
            .get("prompt_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                EngineError::Rejected("submission response carried no prompt_id".to_string())
            })?;

        debug!("Engine accepted graph as {}", prompt_id);
        Ok(EngineJobHandle::new(prompt_id))
    }

    async fn status(&self, handle: &EngineJobHandle) -> Result<EngineStatus, EngineError> {
        let endpoint = format!("/history/{}", urlencoding::encode(handle.as_str()));
        let history = self.get_json(&endpoint).await?;

        if let Some(status) = Self::parse_history(handle, &history) {
            return Ok(status);
        }

        let queue = self.get_json("/queue").await?;
        if Self::queue_contains(handle, &queue) {
            Ok(EngineStatus::Pending)
        } else {
            Ok(EngineStatus::NotFound)
        }
    }
}
