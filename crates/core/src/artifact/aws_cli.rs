//! Object store backend that drives the `aws` command line tool.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::config::AwsCliConfig;
use super::error::ArtifactError;
use super::traits::ObjectStore;
use super::types::SyncReport;

/// `aws s3` based object store.
pub struct AwsCliStore {
    config: AwsCliConfig,
}

impl AwsCliStore {
    /// Creates a new store with the given configuration.
    pub fn new(config: AwsCliConfig) -> Self {
        Self { config }
    }

    /// Creates a store with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AwsCliConfig::default())
    }

    fn s3_uri(bucket: &str, key: &str) -> String {
        if key.is_empty() {
            format!("s3://{}", bucket)
        } else {
            format!("s3://{}/{}", bucket, key)
        }
    }

    /// Builds the full argument list for an `aws s3 <subcommand>` call.
    fn build_args(&self, subcommand: &[String]) -> Vec<String> {
        let mut args = vec!["s3".to_string()];
        args.extend(subcommand.iter().cloned());

        if let Some(ref region) = self.config.region {
            args.extend(["--region".to_string(), region.clone()]);
        }
        if let Some(ref endpoint) = self.config.endpoint_url {
            args.extend(["--endpoint-url".to_string(), endpoint.clone()]);
        }
        if let Some(ref profile) = self.config.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }

        args
    }

    /// Maps a failed invocation to an error, recognising missing objects.
    fn classify_failure(operation: &str, uri: &str, stderr: &str) -> ArtifactError {
        let lowered = stderr.to_lowercase();
        if lowered.contains("(404)")
            || lowered.contains("nosuchkey")
            || lowered.contains("nosuchbucket")
            || lowered.contains("not found")
            || lowered.contains("does not exist")
        {
            return ArtifactError::not_found(uri);
        }

        let reason = stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no error output")
            .to_string();
        ArtifactError::transfer_failed(operation, uri, reason)
    }

    /// Runs the CLI and returns its stdout.
    async fn run(
        &self,
        operation: &str,
        uri: &str,
        subcommand: Vec<String>,
        timeout_secs: u64,
    ) -> Result<String, ArtifactError> {
        let args = self.build_args(&subcommand);
        debug!("Running {:?} {}", self.config.cli_path, args.join(" "));

        let child = Command::new(&self.config.cli_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ArtifactError::CliNotFound {
                        path: self.config.cli_path.clone(),
                    }
                } else {
                    ArtifactError::Io(e)
                }
            })?;

        let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(ArtifactError::Timeout {
                    operation: operation.to_string(),
                    timeout_secs,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::classify_failure(operation, uri, &stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Counts objects reported as downloaded in `aws s3 sync` output.
    fn count_downloads(stdout: &str) -> usize {
        stdout
            .lines()
            .filter(|line| line.trim_start().starts_with("download:"))
            .count()
    }
}

#[async_trait]
impl ObjectStore for AwsCliStore {
    fn name(&self) -> &str {
        "aws-cli"
    }

    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), ArtifactError> {
        let uri = Self::s3_uri(bucket, key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.run(
            "download",
            &uri,
            vec![
                "cp".to_string(),
                uri.clone(),
                dest.to_string_lossy().to_string(),
                "--only-show-errors".to_string(),
            ],
            self.config.transfer_timeout_secs,
        )
        .await?;
        Ok(())
    }

    async fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), ArtifactError> {
        let uri = Self::s3_uri(bucket, key);
        self.run(
            "upload",
            &uri,
            vec![
                "cp".to_string(),
                src.to_string_lossy().to_string(),
                uri.clone(),
                "--only-show-errors".to_string(),
            ],
            self.config.transfer_timeout_secs,
        )
        .await?;
        Ok(())
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ArtifactError> {
        let uri = Self::s3_uri(bucket, key);
        let stdout = self
            .run(
                "presign",
                &uri,
                vec![
                    "presign".to_string(),
                    uri.clone(),
                    "--expires-in".to_string(),
                    expires_in.as_secs().to_string(),
                ],
                self.config.transfer_timeout_secs,
            )
            .await?;

        let url = stdout.trim();
        if url.is_empty() {
            return Err(ArtifactError::transfer_failed(
                "presign",
                uri,
                "empty URL returned",
            ));
        }
        Ok(url.to_string())
    }

    async fn sync_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        dest_dir: &Path,
    ) -> Result<SyncReport, ArtifactError> {
        let uri = Self::s3_uri(bucket, prefix);
        tokio::fs::create_dir_all(dest_dir).await?;

        let stdout = self
            .run(
                "sync",
                &uri,
                vec![
                    "sync".to_string(),
                    uri.clone(),
                    dest_dir.to_string_lossy().to_string(),
                    "--no-progress".to_string(),
                ],
                self.config.sync_timeout_secs,
            )
            .await?;

        Ok(SyncReport {
            files_downloaded: Self::count_downloads(&stdout),
        })
    }

    async fn validate(&self) -> Result<(), ArtifactError> {
        let result = Command::new(&self.config.cli_path)
            .arg("--version")
            .output()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::CliNotFound {
                path: self.config.cli_path.clone(),
            }),
            Err(e) => Err(ArtifactError::Io(e)),
        }
    }
}
