//! Configuration for the engine client and the optional engine process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the engine's HTTP API.
    #[serde(default = "default_url")]
    pub url: String,

    /// Timeout for a single HTTP request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory the engine writes results into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Command to start the engine as a child process. When absent the
    /// engine is assumed to be managed externally.
    #[serde(default)]
    pub launch: Option<LaunchConfig>,
}

/// How to start the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Program to execute.
    pub program: PathBuf,

    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the process.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// How long to wait for the process to exit after killing it.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
}

fn default_url() -> String {
    "http://127.0.0.1:8188".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_stop_timeout() -> u64 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_secs: default_request_timeout(),
            output_dir: default_output_dir(),
            launch: None,
        }
    }
}

impl EngineConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

impl LaunchConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            stop_timeout_secs: default_stop_timeout(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}
