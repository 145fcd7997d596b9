//! Error types for the artifact module.

use std::path::PathBuf;
use thiserror::Error;

use crate::retry::Retryable;

/// Errors that can occur while resolving or publishing artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The reference could not be parsed.
    #[error("Invalid artifact reference '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The artifact does not exist locally or remotely.
    #[error("Artifact not found: {uri}")]
    NotFound { uri: String },

    /// A remote reference was given but no remote backend is configured.
    #[error("Remote storage is not configured, cannot access {uri}")]
    RemoteNotConfigured { uri: String },

    /// The storage CLI binary is missing.
    #[error("Storage CLI not found at path: {path}")]
    CliNotFound { path: PathBuf },

    /// A transfer failed on the backend.
    #[error("{operation} failed for {uri}: {reason}")]
    TransferFailed {
        operation: String,
        uri: String,
        reason: String,
    },

    /// A transfer exceeded its time budget.
    #[error("{operation} timed out after {timeout_secs} seconds")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    /// I/O error on the local filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArtifactError {
    /// Creates an invalid reference error.
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(uri: impl ToString) -> Self {
        Self::NotFound {
            uri: uri.to_string(),
        }
    }

    /// Creates a transfer failed error.
    pub fn transfer_failed(
        operation: impl Into<String>,
        uri: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TransferFailed {
            operation: operation.into(),
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Whether the artifact is definitively unavailable to the caller.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::RemoteNotConfigured { .. } | Self::InvalidUri { .. }
        )
    }
}

impl Retryable for ArtifactError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransferFailed { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ArtifactError::transfer_failed("download", "s3://b/k", "reset").is_retryable());
        assert!(!ArtifactError::not_found("s3://b/k").is_retryable());
        assert!(!ArtifactError::invalid_uri("x", "bad").is_retryable());
        assert!(!ArtifactError::CliNotFound {
            path: PathBuf::from("aws")
        }
        .is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ArtifactError::not_found("local:/in/a.mp3");
        assert_eq!(err.to_string(), "Artifact not found: local:/in/a.mp3");

        let err = ArtifactError::transfer_failed("upload", "s3://b/k", "denied");
        assert_eq!(err.to_string(), "upload failed for s3://b/k: denied");
    }
}
