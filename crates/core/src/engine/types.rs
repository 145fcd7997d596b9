//! Types exchanged with the generation engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque identifier the engine assigns to a submitted graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineJobHandle(String);

impl EngineJobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EngineJobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of artifact a node produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Image,
    Video,
    Audio,
}

impl OutputKind {
    /// Maps a node output key (`images`, `gifs`, `videos`, `audio`).
    pub fn from_output_key(key: &str) -> Option<Self> {
        match key {
            "images" => Some(Self::Image),
            "gifs" | "videos" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// A file produced by one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub node_id: String,
    pub kind: OutputKind,
    pub filename: String,
    /// Subdirectory below the engine output directory, possibly empty.
    pub subfolder: String,
    /// `output` for saved results, `temp` for previews.
    pub location_type: String,
}

impl OutputArtifact {
    /// Path relative to the engine output directory.
    pub fn relative_path(&self) -> PathBuf {
        if self.subfolder.is_empty() {
            PathBuf::from(&self.filename)
        } else {
            PathBuf::from(&self.subfolder).join(&self.filename)
        }
    }

    pub fn is_saved_output(&self) -> bool {
        self.location_type == "output"
    }
}

/// Outputs of a finished job, in node-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResult {
    pub outputs: Vec<OutputArtifact>,
}

/// What the engine reports for a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Neither finished nor queued.
    NotFound,
    /// Queued or running.
    Pending,
    /// Finished successfully.
    Completed(EngineResult),
    /// Finished with an execution error.
    Failed(String),
}

impl EngineStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_key_mapping() {
        assert_eq!(OutputKind::from_output_key("images"), Some(OutputKind::Image));
        assert_eq!(OutputKind::from_output_key("gifs"), Some(OutputKind::Video));
        assert_eq!(OutputKind::from_output_key("videos"), Some(OutputKind::Video));
        assert_eq!(OutputKind::from_output_key("audio"), Some(OutputKind::Audio));
        assert_eq!(OutputKind::from_output_key("text"), None);
    }

    #[test]
    fn test_relative_path() {
        let mut artifact = OutputArtifact {
            node_id: "9".to_string(),
            kind: OutputKind::Video,
            filename: "r1.mp4".to_string(),
            subfolder: String::new(),
            location_type: "output".to_string(),
        };
        assert_eq!(artifact.relative_path(), PathBuf::from("r1.mp4"));

        artifact.subfolder = "video".to_string();
        assert_eq!(artifact.relative_path(), PathBuf::from("video/r1.mp4"));
    }

    #[test]
    fn test_handle_serializes_as_string() {
        let handle = EngineJobHandle::new("abc-123");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"abc-123\"");
        assert_eq!(handle.to_string(), "abc-123");
    }
}
