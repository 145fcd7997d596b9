//! Trait definitions for the artifact module.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::error::ArtifactError;
use super::types::SyncReport;

/// A remote object store backend.
///
/// Implementations only move bytes; caching, retries and path layout are the
/// responsibility of [`super::ArtifactStore`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Downloads `bucket/key` to `dest`, overwriting it.
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), ArtifactError>;

    /// Uploads `src` to `bucket/key`.
    async fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), ArtifactError>;

    /// Returns a time-limited URL granting read access to `bucket/key`.
    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ArtifactError>;

    /// Mirrors everything under `bucket/prefix` into `dest_dir`, downloading
    /// only new or changed objects. Never uploads or deletes.
    async fn sync_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        dest_dir: &Path,
    ) -> Result<SyncReport, ArtifactError>;

    /// Validates that the backend is usable.
    async fn validate(&self) -> Result<(), ArtifactError>;
}
