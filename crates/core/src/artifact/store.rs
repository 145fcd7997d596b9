//! Artifact store client: resolves inputs to local files and republishes outputs.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::metrics::ARTIFACT_TRANSFERS;
use crate::retry::retry_async;

use super::config::StorageConfig;
use super::error::ArtifactError;
use super::traits::ObjectStore;
use super::types::{join_key, ArtifactRef};

/// Uniform get/put over the local filesystem and an optional remote backend.
pub struct ArtifactStore {
    config: StorageConfig,
    remote: Option<Arc<dyn ObjectStore>>,
    /// One lock per cache entry so concurrent resolves of the same remote
    /// artifact download it once. Entries live only while someone holds them.
    entry_locks: EntryLocks,
}

type EntryLocks = StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

impl ArtifactStore {
    /// Creates a store. Remote references fail when `remote` is `None`.
    pub fn new(config: StorageConfig, remote: Option<Arc<dyn ObjectStore>>) -> Self {
        Self {
            config,
            remote,
            entry_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Creates a store that only serves local references.
    pub fn local_only(config: StorageConfig) -> Self {
        Self::new(config, None)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The remote backend, if configured.
    pub fn remote(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.remote.as_ref()
    }

    /// Local cache location for a remote object: `<cache_dir>/<bucket>/<key>`.
    pub fn cache_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ArtifactError> {
        let uri = ArtifactRef::remote(bucket, key).to_string();
        let relative = Path::new(bucket).join(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(ArtifactError::invalid_uri(uri, "key cannot be cached safely"));
        }
        Ok(self.config.cache_dir.join(relative))
    }

    /// Resolves a reference to a readable local file.
    ///
    /// Local references are checked for existence and returned unchanged.
    /// Remote references are downloaded into the cache unless already present.
    pub async fn resolve(&self, reference: &ArtifactRef) -> Result<PathBuf, ArtifactError> {
        match reference {
            ArtifactRef::Local(path) => match fs::metadata(path).await {
                Ok(meta) if meta.is_file() => Ok(path.clone()),
                _ => Err(ArtifactError::not_found(reference)),
            },
            ArtifactRef::Remote { bucket, key } => self.resolve_remote(bucket, key).await,
        }
    }

    async fn resolve_remote(&self, bucket: &str, key: &str) -> Result<PathBuf, ArtifactError> {
        let uri = ArtifactRef::remote(bucket, key).to_string();
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| ArtifactError::RemoteNotConfigured { uri: uri.clone() })?;

        let dest = self.cache_path(bucket, key)?;
        let _entry = EntryLock::acquire(&self.entry_locks, &dest).await;

        if fs::metadata(&dest).await.is_ok() {
            debug!("Cache hit for {} at {:?}", uri, dest);
            return Ok(dest);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(&dest);
        info!("Downloading {} to {:?}", uri, dest);

        let result = retry_async(&self.config.download_retry, "download", |_| {
            remote.download(bucket, key, &partial)
        })
        .await;

        if let Err(e) = result {
            ARTIFACT_TRANSFERS
                .with_label_values(&["download", "failure"])
                .inc();
            let _ = fs::remove_file(&partial).await;
            return Err(e);
        }

        fs::rename(&partial, &dest).await?;
        ARTIFACT_TRANSFERS
            .with_label_values(&["download", "success"])
            .inc();
        Ok(dest)
    }

    /// Republishes a local file to a destination prefix and returns an
    /// externally addressable reference.
    ///
    /// Remote destinations get the file uploaded under `<prefix>/<file name>`
    /// and return a presigned URL. Local destinations get the file moved into
    /// the directory and return its `local:` reference.
    pub async fn publish(
        &self,
        local_path: &Path,
        destination: &ArtifactRef,
    ) -> Result<String, ArtifactError> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ArtifactError::invalid_uri(local_path.display().to_string(), "no file name")
            })?
            .to_string();

        self.publish_as(local_path, destination, &file_name).await
    }

    /// Like [`publish`](Self::publish), but stores the file under `name`
    /// relative to the destination. `name` may contain `/` separated
    /// directories; anything that would leave the destination is rejected.
    pub async fn publish_as(
        &self,
        local_path: &Path,
        destination: &ArtifactRef,
        name: &str,
    ) -> Result<String, ArtifactError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(ArtifactError::invalid_uri(
                name.to_string(),
                "output name must stay inside the destination",
            ));
        }

        if fs::metadata(local_path).await.is_err() {
            return Err(ArtifactError::not_found(ArtifactRef::local(local_path)));
        }

        match destination {
            ArtifactRef::Remote { bucket, key } => {
                let object_key = join_key(key, name);
                self.publish_remote(local_path, bucket, &object_key).await
            }
            ArtifactRef::Local(dir) => {
                let target = dir.join(relative);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).await?;
                }
                if target != local_path {
                    move_file(local_path, &target).await?;
                }
                debug!("Published {:?} to {:?}", local_path, target);
                Ok(ArtifactRef::Local(target).to_string())
            }
        }
    }

    async fn publish_remote(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> Result<String, ArtifactError> {
        let uri = ArtifactRef::remote(bucket, key).to_string();
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| ArtifactError::RemoteNotConfigured { uri: uri.clone() })?;

        info!("Uploading {:?} to {}", local_path, uri);
        let uploaded = retry_async(&self.config.upload_retry, "upload", |_| {
            remote.upload(local_path, bucket, key)
        })
        .await;

        if let Err(e) = uploaded {
            ARTIFACT_TRANSFERS
                .with_label_values(&["upload", "failure"])
                .inc();
            return Err(e);
        }
        ARTIFACT_TRANSFERS
            .with_label_values(&["upload", "success"])
            .inc();

        let expires_in = Duration::from_secs(self.config.presign_expiry_secs);
        retry_async(&self.config.upload_retry, "presign", |_| {
            remote.presign(bucket, key, expires_in)
        })
        .await
    }
}

/// Exclusive hold on one cache entry. The map slot is removed when the last
/// holder lets go.
struct EntryLock<'a> {
    locks: &'a EntryLocks,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<'a> EntryLock<'a> {
    async fn acquire(locks: &'a EntryLocks, path: &Path) -> EntryLock<'a> {
        let lock = {
            let mut map = locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                map.entry(path.to_path_buf())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        EntryLock {
            locks,
            path: path.to_path_buf(),
            lock,
            guard: Some(guard),
        }
    }
}

impl Drop for EntryLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Clones are only handed out under the map lock, so two means the
        // map and this holder are the only references left.
        if Arc::strong_count(&self.lock) == 2 {
            map.remove(&self.path);
        }
    }
}

/// `<dest>.part`, the in-progress name for a download.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}

/// Moves a file, falling back to copy + delete across filesystems.
async fn move_file(source: &Path, destination: &Path) -> Result<(), ArtifactError> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            warn!(
                "Cross-device move from {:?} to {:?}, copying instead",
                source, destination
            );
            fs::copy(source, destination).await?;
            fs::remove_file(source).await?;
            Ok(())
        }
        Err(e) => Err(ArtifactError::Io(e)),
    }
}
