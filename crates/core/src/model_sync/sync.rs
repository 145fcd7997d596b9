//! One-shot model cache synchronization.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{ArtifactRef, ObjectStore};
use crate::metrics::MODEL_SYNC_RUNS;

use super::config::ModelSyncConfig;

/// Result of a sync run. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No source configured.
    Skipped,
    /// The local directory now mirrors the source.
    Synced {
        files_downloaded: usize,
        duration_ms: u64,
    },
    /// The sync did not complete; the engine starts with what is on disk.
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Synced { .. } => "synced",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Mirrors a remote model prefix into the local model directory.
pub struct ModelSync {
    config: ModelSyncConfig,
    remote: Option<Arc<dyn ObjectStore>>,
}

impl ModelSync {
    pub fn new(config: ModelSyncConfig, remote: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { config, remote }
    }

    /// Runs the sync once. Failures are logged and reported, never returned.
    pub async fn run(&self) -> SyncOutcome {
        let outcome = self.sync().await;
        MODEL_SYNC_RUNS.with_label_values(&[outcome.as_str()]).inc();

        match &outcome {
            SyncOutcome::Skipped => info!("No model source configured, skipping model sync"),
            SyncOutcome::Synced {
                files_downloaded,
                duration_ms,
            } => info!(
                "Model sync finished: {} file(s) downloaded in {} ms",
                files_downloaded, duration_ms
            ),
            SyncOutcome::Failed { reason } => warn!(
                "Model sync failed, continuing with local models in {:?}: {}",
                self.config.model_dir, reason
            ),
        }
        outcome
    }

    async fn sync(&self) -> SyncOutcome {
        let Some(ref source) = self.config.source else {
            return SyncOutcome::Skipped;
        };

        let (bucket, prefix) = match source {
            ArtifactRef::Remote { bucket, key } => (bucket, key),
            ArtifactRef::Local(_) => {
                return SyncOutcome::Failed {
                    reason: format!("model source {} is not a remote reference", source),
                }
            }
        };

        let Some(ref remote) = self.remote else {
            return SyncOutcome::Failed {
                reason: "remote storage is not configured".to_string(),
            };
        };

        info!("Syncing models from {} to {:?}", source, self.config.model_dir);
        let started = Instant::now();
        let sync = remote.sync_prefix(bucket, prefix, &self.config.model_dir);

        let result = match self.config.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), sync).await {
                Ok(result) => result,
                Err(_) => {
                    return SyncOutcome::Failed {
                        reason: format!("timed out after {} seconds", secs),
                    }
                }
            },
            None => sync.await,
        };

        match result {
            Ok(report) => SyncOutcome::Synced {
                files_downloaded: report.files_downloaded,
                duration_ms: started.elapsed().as_millis() as u64,
            },
            Err(e) => SyncOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
