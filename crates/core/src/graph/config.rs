//! Configuration for graph templates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::InputSlot;

/// Graph template configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Directory holding `*.json` templates.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Template used when a request does not name one.
    #[serde(default = "default_template_name")]
    pub default_template: String,

    /// Node input names that receive each resolved artifact.
    #[serde(default)]
    pub slots: SlotInputs,
}

/// Input names bound to each slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInputs {
    #[serde(default = "default_audio_input")]
    pub audio: String,
    #[serde(default = "default_transcript_input")]
    pub transcript: String,
    #[serde(default = "default_image_input")]
    pub image: String,
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("workflows")
}

fn default_template_name() -> String {
    "default".to_string()
}

fn default_audio_input() -> String {
    "audio".to_string()
}

fn default_transcript_input() -> String {
    "text_file".to_string()
}

fn default_image_input() -> String {
    "image".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            default_template: default_template_name(),
            slots: SlotInputs::default(),
        }
    }
}

impl Default for SlotInputs {
    fn default() -> Self {
        Self {
            audio: default_audio_input(),
            transcript: default_transcript_input(),
            image: default_image_input(),
        }
    }
}

impl GraphConfig {
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = name.into();
        self
    }
}

impl SlotInputs {
    /// The node input name for a slot.
    pub fn input_for(&self, slot: InputSlot) -> &str {
        match slot {
            InputSlot::Audio => &self.audio,
            InputSlot::Transcript => &self.transcript,
            InputSlot::Image => &self.image,
        }
    }
}
