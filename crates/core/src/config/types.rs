use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::artifact::StorageConfig;
use crate::engine::EngineConfig;
use crate::graph::GraphConfig;
use crate::job::JobsConfig;
use crate::model_sync::ModelSyncConfig;
use crate::readiness::ReadinessConfig;
use crate::retry::RetryConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub model_sync: ModelSyncConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (launch arguments and credentials
/// profile hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub engine: SanitizedEngineConfig,
    pub storage: SanitizedStorageConfig,
    pub model_sync: ModelSyncConfig,
    pub readiness: ReadinessConfig,
    pub jobs: JobsConfig,
    pub graph: GraphConfig,
}

/// Sanitized engine config (launch command reduced to its program)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEngineConfig {
    pub url: String,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_program: Option<PathBuf>,
}

/// Sanitized storage config (profile hidden, just shows if configured)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub cache_dir: PathBuf,
    pub presign_expiry_secs: u64,
    pub download_retry: RetryConfig,
    pub upload_retry: RetryConfig,
    pub remote_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    pub profile_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let engine = &config.engine;
        let storage = &config.storage;
        Self {
            server: config.server.clone(),
            engine: SanitizedEngineConfig {
                url: engine.url.clone(),
                request_timeout_secs: engine.request_timeout_secs,
                output_dir: engine.output_dir.clone(),
                launch_program: engine.launch.as_ref().map(|l| l.program.clone()),
            },
            storage: SanitizedStorageConfig {
                cache_dir: storage.cache_dir.clone(),
                presign_expiry_secs: storage.presign_expiry_secs,
                download_retry: storage.download_retry.clone(),
                upload_retry: storage.upload_retry.clone(),
                remote_enabled: storage.remote.enabled,
                region: storage.remote.region.clone(),
                endpoint_url: storage.remote.endpoint_url.clone(),
                profile_configured: storage.remote.profile.is_some(),
            },
            model_sync: config.model_sync.clone(),
            readiness: config.readiness.clone(),
            jobs: config.jobs.clone(),
            graph: config.graph.clone(),
        }
    }
}
