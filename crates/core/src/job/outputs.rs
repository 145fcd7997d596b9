//! Output resolution and republishing.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::artifact::{ArtifactRef, ArtifactStore};
use crate::engine::{EngineResult, OutputArtifact, OutputKind};

use super::error::JobError;

/// Locates engine outputs on disk and publishes them to a destination.
pub struct OutputResolver {
    store: Arc<ArtifactStore>,
    output_root: PathBuf,
    publish_kinds: Vec<OutputKind>,
}

impl OutputResolver {
    pub fn new(store: Arc<ArtifactStore>, output_root: PathBuf, publish_kinds: Vec<OutputKind>) -> Self {
        Self {
            store,
            output_root,
            publish_kinds,
        }
    }

    /// Outputs that will be published, in node order.
    pub fn publishable<'a>(&'a self, result: &'a EngineResult) -> impl Iterator<Item = &'a OutputArtifact> {
        result
            .outputs
            .iter()
            .filter(|o| o.is_saved_output() && self.publish_kinds.contains(&o.kind))
    }

    /// Local path of an output below the output root.
    pub fn local_path(&self, output: &OutputArtifact) -> Result<PathBuf, JobError> {
        let relative = output.relative_path();
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || output.filename.is_empty() {
            return Err(JobError::OutputMissing {
                path: self.output_root.join(relative),
            });
        }
        Ok(self.output_root.join(relative))
    }

    /// Publishes every publishable output and returns the references in order.
    ///
    /// Outputs are named by file name. When two outputs share a file name
    /// they keep their subfolder, so `a/x.png` and `b/x.png` stay distinct.
    /// A declared output that is not on disk fails the whole job.
    pub async fn publish_all(
        &self,
        result: &EngineResult,
        destination: &ArtifactRef,
    ) -> Result<Vec<String>, JobError> {
        let outputs: Vec<&OutputArtifact> = self.publishable(result).collect();
        let skipped = result.outputs.len() - outputs.len();
        if skipped > 0 {
            debug!("Skipping {} preview or unpublished output(s)", skipped);
        }

        let mut files: Vec<(PathBuf, &OutputArtifact)> = Vec::with_capacity(outputs.len());
        for output in outputs {
            let path = self.local_path(output)?;
            if files.iter().any(|(seen, _)| *seen == path) {
                debug!("Output {:?} reported twice, publishing once", path);
                continue;
            }
            if !is_file(&path).await {
                return Err(JobError::OutputMissing { path });
            }
            files.push((path, output));
        }

        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for (_, output) in &files {
            *name_counts.entry(output.filename.as_str()).or_default() += 1;
        }
        let named: Vec<(&PathBuf, String)> = files
            .iter()
            .map(|(path, output)| {
                let name = if name_counts[output.filename.as_str()] > 1 {
                    published_name(output)
                } else {
                    output.filename.clone()
                };
                (path, name)
            })
            .collect();

        // Results keep node order
        let uploads = named.iter().map(|(path, name)| async move {
            let reference = self
                .store
                .publish_as(path, destination, name)
                .await
                .map_err(JobError::Storage)?;
            info!("Published {:?} as {}", path, reference);
            Ok::<_, JobError>(reference)
        });
        futures::future::try_join_all(uploads).await
    }
}

/// `<subfolder>/<filename>` with `/` separators on every platform.
fn published_name(output: &OutputArtifact) -> String {
    output
        .relative_path()
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
