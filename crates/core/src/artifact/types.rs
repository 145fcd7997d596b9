//! Artifact references.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ArtifactError;

/// Identifies an input or output artifact, either on the local filesystem or
/// in a remote object store.
///
/// Accepted spellings:
/// - `local:/abs/path`, `file:///abs/path` or a bare path
/// - `s3://bucket/key` (the key may be empty when used as a destination prefix)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArtifactRef {
    Local(PathBuf),
    Remote { bucket: String, key: String },
}

impl ArtifactRef {
    /// Parses a reference from its URI form.
    pub fn parse(uri: &str) -> Result<Self, ArtifactError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ArtifactError::invalid_uri(uri, "empty reference"));
        }

        if let Some(rest) = uri.strip_prefix("s3://") {
            let (bucket, key) = match rest.split_once('/') {
                Some((bucket, key)) => (bucket, key.trim_matches('/')),
                None => (rest, ""),
            };
            if bucket.is_empty() {
                return Err(ArtifactError::invalid_uri(uri, "missing bucket"));
            }
            return Ok(Self::Remote {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let path = if let Some(rest) = uri.strip_prefix("local:") {
            rest
        } else if let Some(rest) = uri.strip_prefix("file://") {
            rest
        } else if let Some((scheme, _)) = uri.split_once("://") {
            return Err(ArtifactError::invalid_uri(
                uri,
                format!("unsupported scheme '{}'", scheme),
            ));
        } else {
            uri
        };

        if path.is_empty() {
            return Err(ArtifactError::invalid_uri(uri, "missing path"));
        }

        Ok(Self::Local(PathBuf::from(path)))
    }

    /// Creates a local reference.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local(path.into())
    }

    /// Creates a remote reference.
    pub fn remote(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Remote {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns the local path for local references.
    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote { .. } => None,
        }
    }

    /// Treats this reference as a prefix and appends a file name to it.
    pub fn join(&self, name: &str) -> Self {
        match self {
            Self::Local(dir) => Self::Local(dir.join(name)),
            Self::Remote { bucket, key } => Self::Remote {
                bucket: bucket.clone(),
                key: join_key(key, name),
            },
        }
    }
}

/// Joins an object key prefix and a file name with a single slash.
pub(crate) fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "local:{}", path.display()),
            Self::Remote { bucket, key } if key.is_empty() => write!(f, "s3://{}", bucket),
            Self::Remote { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

impl FromStr for ArtifactRef {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArtifactRef {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactRef> for String {
    fn from(value: ArtifactRef) -> Self {
        value.to_string()
    }
}

/// Summary of a prefix synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Number of objects that were new or changed and got downloaded.
    pub files_downloaded: usize,
}
