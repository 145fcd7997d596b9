//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! (`Engine`, `ObjectStore`), allowing end-to-end job tests without a real
//! engine or object store.
//!
//! # Example
//!
//! ```rust,ignore
//! use graphrelay_core::testing::{fixtures, MockEngine, MockObjectStore};
//!
//! let engine = MockEngine::new();
//! let store = MockObjectStore::new();
//!
//! engine.complete_with(fixtures::engine_result(&["r1.mp4"])).await;
//! store.put_object("inputs", "t1/audio.wav", b"RIFF").await;
//! ```

mod mock_engine;
mod mock_object_store;

pub use mock_engine::MockEngine;
pub use mock_object_store::{MockObjectStore, ObjectStoreCalls};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::engine::{EngineResult, OutputArtifact, OutputKind};
    use crate::graph::{GraphTemplate, SlotInputs};

    /// A minimal template binding all three slots.
    pub const TEMPLATE_JSON: &str = r#"{
        "1": {"class_type": "LoadAudio", "inputs": {"audio": "placeholder.wav"}},
        "2": {"class_type": "LoadTextFile", "inputs": {"text_file": "placeholder.txt"}},
        "3": {"class_type": "LoadImage", "inputs": {"image": "placeholder.png"}},
        "4": {"class_type": "Render", "inputs": {
            "audio": ["1", 0], "text": ["2", 0], "image": ["3", 0], "fps": 25
        }},
        "5": {"class_type": "SaveVideo", "inputs": {"frames": ["4", 0], "filename_prefix": "render"}}
    }"#;

    /// The minimal template, parsed with default slot input names.
    pub fn graph_template(name: &str) -> GraphTemplate {
        GraphTemplate::from_json(name, TEMPLATE_JSON, &SlotInputs::default())
            .expect("fixture template is valid")
    }

    /// A saved output of the given kind.
    pub fn output(node_id: &str, filename: &str, kind: OutputKind) -> OutputArtifact {
        OutputArtifact {
            node_id: node_id.to_string(),
            kind,
            filename: filename.to_string(),
            subfolder: String::new(),
            location_type: "output".to_string(),
        }
    }

    /// A result with one saved video per filename, on consecutive nodes.
    pub fn engine_result(filenames: &[&str]) -> EngineResult {
        EngineResult {
            outputs: filenames
                .iter()
                .enumerate()
                .map(|(i, name)| output(&(10 + i).to_string(), name, OutputKind::Video))
                .collect(),
        }
    }
}
