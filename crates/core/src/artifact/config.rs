//! Configuration for the artifact module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::RetryConfig;

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local cache root for resolved remote inputs.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Lifetime of presigned output URLs in seconds.
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,

    /// Retry policy for downloads.
    #[serde(default)]
    pub download_retry: RetryConfig,

    /// Retry policy for uploads (and presigning).
    #[serde(default)]
    pub upload_retry: RetryConfig,

    /// Remote backend settings.
    #[serde(default)]
    pub remote: AwsCliConfig,
}

/// Settings for the `aws` CLI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsCliConfig {
    /// Whether remote references are served at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the aws binary.
    #[serde(default = "default_cli_path")]
    pub cli_path: PathBuf,

    /// Region override.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint (for S3-compatible stores).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Named credentials profile.
    #[serde(default)]
    pub profile: Option<String>,

    /// Timeout for a single object transfer in seconds.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,

    /// Timeout for a whole prefix sync in seconds.
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("graphrelay").join("inputs")
}

fn default_presign_expiry() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_cli_path() -> PathBuf {
    PathBuf::from("aws")
}

fn default_transfer_timeout() -> u64 {
    600
}

fn default_sync_timeout() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            presign_expiry_secs: default_presign_expiry(),
            download_retry: RetryConfig::default(),
            upload_retry: RetryConfig::default(),
            remote: AwsCliConfig::default(),
        }
    }
}

impl Default for AwsCliConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cli_path: default_cli_path(),
            region: None,
            endpoint_url: None,
            profile: None,
            transfer_timeout_secs: default_transfer_timeout(),
            sync_timeout_secs: default_sync_timeout(),
        }
    }
}

impl StorageConfig {
    /// Sets the cache directory.
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Uses the same retry policy for downloads and uploads.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.download_retry = retry.clone();
        self.upload_retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.presign_expiry_secs, 3600);
        assert!(config.remote.enabled);
        assert_eq!(config.remote.cli_path, PathBuf::from("aws"));
        assert!(config.remote.region.is_none());
    }

    #[test]
    fn test_deserialize_remote_section() {
        let toml = r#"
            cache_dir = "/app/inputs"

            [remote]
            region = "us-east-1"
            transfer_timeout_secs = 120
        "#;
        let config: StorageConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/app/inputs"));
        assert_eq!(config.remote.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.remote.transfer_timeout_secs, 120);
        assert!(config.remote.enabled);
    }
}
