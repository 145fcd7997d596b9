//! Injection of resolved artifact paths into a template.

use serde_json::Value;

use super::types::{GraphInstance, GraphTemplate, InputSlot, ResolvedInputs};

/// Deep-copies `template` and writes each resolved path into every input
/// bound to its slot. The template itself is never modified.
pub fn parameterize(template: &GraphTemplate, inputs: &ResolvedInputs) -> GraphInstance {
    let mut instance = GraphInstance::new(template.nodes().clone());
    let nodes = instance.nodes_mut();

    for slot in InputSlot::ALL {
        let path = inputs.get(slot).to_string_lossy().into_owned();
        for binding in template.bindings(slot) {
            if let Some(node) = nodes.get_mut(&binding.node_id) {
                node.inputs
                    .insert(binding.input.clone(), Value::String(path.clone()));
            }
        }
    }

    instance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SlotInputs;
    use std::path::PathBuf;

    fn inputs() -> ResolvedInputs {
        ResolvedInputs {
            audio: PathBuf::from("/cache/in/a.wav"),
            transcript: PathBuf::from("/cache/in/t.txt"),
            image: PathBuf::from("/cache/in/i.png"),
        }
    }

    #[test]
    fn test_every_binding_is_overwritten() {
        let json = r#"{
            "1": {"class_type": "LoadAudio", "inputs": {"audio": "old.wav"}},
            "2": {"class_type": "LoadAudio", "inputs": {"audio": "other.wav", "gain": 1.0}},
            "3": {"class_type": "LoadText", "inputs": {"text_file": "old.txt"}},
            "4": {"class_type": "LoadImage", "inputs": {"image": "old.png"}},
            "5": {"class_type": "Scale", "inputs": {"image": ["4", 0]}}
        }"#;
        let template = GraphTemplate::from_json("t", json, &SlotInputs::default()).unwrap();

        let instance = parameterize(&template, &inputs());

        assert_eq!(instance.input("1", "audio").unwrap(), "/cache/in/a.wav");
        assert_eq!(instance.input("2", "audio").unwrap(), "/cache/in/a.wav");
        assert_eq!(instance.input("2", "gain").unwrap(), 1.0);
        assert_eq!(instance.input("3", "text_file").unwrap(), "/cache/in/t.txt");
        assert_eq!(instance.input("4", "image").unwrap(), "/cache/in/i.png");
        assert_eq!(
            instance.input("5", "image").unwrap(),
            &serde_json::json!(["4", 0])
        );
    }

    #[test]
    fn test_template_is_untouched() {
        let json = r#"{
            "1": {"class_type": "LoadAudio", "inputs": {"audio": "old.wav"}},
            "2": {"class_type": "LoadText", "inputs": {"text_file": "old.txt"}},
            "3": {"class_type": "LoadImage", "inputs": {"image": "old.png"}}
        }"#;
        let template = GraphTemplate::from_json("t", json, &SlotInputs::default()).unwrap();

        let _ = parameterize(&template, &inputs());

        assert_eq!(template.nodes()["1"].inputs["audio"], "old.wav");
    }
}
