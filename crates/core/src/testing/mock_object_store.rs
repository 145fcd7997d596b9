//! Mock object store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::artifact::{ArtifactError, ObjectStore, SyncReport};

/// Call counters for assertions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectStoreCalls {
    pub downloads: usize,
    pub uploads: usize,
    pub presigns: usize,
    pub syncs: usize,
}

/// In-memory implementation of the ObjectStore trait.
///
/// Provides controllable behavior for testing:
/// - Seed objects and read back uploads
/// - Count calls per operation
/// - Inject transient transfer failures
/// - Simulate latency
///
/// # Example
///
/// ```rust,ignore
/// use graphrelay_core::testing::MockObjectStore;
///
/// let store = MockObjectStore::new();
/// store.put_object("inputs", "t1/audio.wav", b"RIFF").await;
/// store.fail_next_transfers(1).await;
///
/// // ... resolve through an ArtifactStore ...
///
/// assert_eq!(store.download_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockObjectStore {
    /// Objects keyed by (bucket, key).
    objects: Arc<RwLock<BTreeMap<(String, String), Vec<u8>>>>,
    calls: Arc<RwLock<ObjectStoreCalls>>,
    /// Remaining downloads/uploads that fail with a transient error.
    failing_transfers: Arc<RwLock<u32>>,
    /// If set, every sync fails with this reason.
    sync_failure: Arc<RwLock<Option<String>>>,
    latency: Arc<RwLock<Duration>>,
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            calls: Arc::new(RwLock::new(ObjectStoreCalls::default())),
            failing_transfers: Arc::new(RwLock::new(0)),
            sync_failure: Arc::new(RwLock::new(None)),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Seed an object.
    pub async fn put_object(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    /// Read an object back.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// All keys stored in a bucket.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Make the next `count` downloads or uploads fail transiently.
    pub async fn fail_next_transfers(&self, count: u32) {
        *self.failing_transfers.write().await = count;
    }

    /// Make every sync fail with `reason`.
    pub async fn fail_syncs(&self, reason: &str) {
        *self.sync_failure.write().await = Some(reason.to_string());
    }

    /// Delay every operation by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    pub async fn calls(&self) -> ObjectStoreCalls {
        self.calls.read().await.clone()
    }

    pub async fn download_count(&self) -> usize {
        self.calls.read().await.downloads
    }

    pub async fn upload_count(&self) -> usize {
        self.calls.read().await.uploads
    }

    pub async fn total_calls(&self) -> usize {
        let calls = self.calls.read().await;
        calls.downloads + calls.uploads + calls.presigns + calls.syncs
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// Consume one injected failure, if any remain.
    async fn take_failure(&self, operation: &str, bucket: &str, key: &str) -> Option<ArtifactError> {
        let mut remaining = self.failing_transfers.write().await;
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;
        Some(ArtifactError::transfer_failed(
            operation,
            format!("s3://{}/{}", bucket, key),
            "simulated network failure",
        ))
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), ArtifactError> {
        self.calls.write().await.downloads += 1;
        self.simulate_latency().await;

        if let Some(err) = self.take_failure("download", bucket, key).await {
            return Err(err);
        }

        let data = self
            .object(bucket, key)
            .await
            .ok_or_else(|| ArtifactError::not_found(format!("s3://{}/{}", bucket, key)))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, data).await?;
        Ok(())
    }

    async fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), ArtifactError> {
        self.calls.write().await.uploads += 1;
        self.simulate_latency().await;

        if let Some(err) = self.take_failure("upload", bucket, key).await {
            return Err(err);
        }

        let data = tokio::fs::read(src).await?;
        self.put_object(bucket, key, &data).await;
        Ok(())
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ArtifactError> {
        self.calls.write().await.presigns += 1;
        Ok(format!(
            "https://{}.mock-s3.local/{}?X-Amz-Expires={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    async fn sync_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        dest_dir: &Path,
    ) -> Result<SyncReport, ArtifactError> {
        self.calls.write().await.syncs += 1;
        self.simulate_latency().await;

        if let Some(reason) = self.sync_failure.read().await.clone() {
            return Err(ArtifactError::transfer_failed(
                "sync",
                format!("s3://{}/{}", bucket, prefix),
                reason,
            ));
        }

        let prefix = prefix.trim_end_matches('/');
        let objects: Vec<(String, Vec<u8>)> = self
            .objects
            .read()
            .await
            .iter()
            .filter(|((b, _), _)| b == bucket)
            .filter_map(|((_, k), data)| {
                let relative = if prefix.is_empty() {
                    k.as_str()
                } else {
                    k.strip_prefix(prefix)?.strip_prefix('/')?
                };
                Some((relative.to_string(), data.clone()))
            })
            .collect();

        let mut report = SyncReport::default();
        for (relative, data) in objects {
            let dest = dest_dir.join(&relative);
            if tokio::fs::read(&dest).await.ok().as_deref() == Some(data.as_slice()) {
                continue;
            }
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&dest, &data).await?;
            report.files_downloaded += 1;
        }
        Ok(report)
    }

    async fn validate(&self) -> Result<(), ArtifactError> {
        Ok(())
    }
}
