//! Configuration for model synchronization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::artifact::ArtifactRef;

/// Model sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSyncConfig {
    /// Remote prefix to mirror (`s3://bucket/prefix`). No sync when absent.
    #[serde(default)]
    pub source: Option<ArtifactRef>,

    /// Local model directory the engine loads from.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Upper bound for the whole sync in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

impl Default for ModelSyncConfig {
    fn default() -> Self {
        Self {
            source: None,
            model_dir: default_model_dir(),
            timeout_secs: None,
        }
    }
}

impl ModelSyncConfig {
    pub fn with_source(mut self, source: ArtifactRef) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }
}
