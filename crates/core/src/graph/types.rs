//! Types for processing-graph templates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use super::config::SlotInputs;
use super::error::GraphError;

/// Artifact slots a template can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSlot {
    Audio,
    Transcript,
    Image,
}

impl InputSlot {
    pub const ALL: [InputSlot; 3] = [InputSlot::Audio, InputSlot::Transcript, InputSlot::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputSlot::Audio => "audio",
            InputSlot::Transcript => "transcript",
            InputSlot::Image => "image",
        }
    }
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a processing graph in the engine's API format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Engine node type.
    pub class_type: String,

    /// Named inputs. Values are literals or `[node_id, output_index]` links.
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Anything else the engine attaches to a node (e.g. `_meta`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a slot's path is written in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBinding {
    pub node_id: String,
    pub input: String,
}

/// A validated, read-only graph template.
#[derive(Debug, Clone)]
pub struct GraphTemplate {
    name: String,
    nodes: BTreeMap<String, GraphNode>,
    bindings: HashMap<InputSlot, Vec<SlotBinding>>,
}

impl GraphTemplate {
    /// Parses and validates a template.
    ///
    /// Every slot must be bound by at least one literal node input named as in
    /// `slots`. Inputs holding links to other nodes are never bound.
    pub fn from_json(name: &str, json: &str, slots: &SlotInputs) -> Result<Self, GraphError> {
        let nodes: BTreeMap<String, GraphNode> =
            serde_json::from_str(json).map_err(|e| GraphError::parse(name, e))?;
        if nodes.is_empty() {
            return Err(GraphError::parse(name, "graph has no nodes"));
        }
        Self::from_nodes(name, nodes, slots)
    }

    /// Builds a template from already parsed nodes.
    pub fn from_nodes(
        name: &str,
        nodes: BTreeMap<String, GraphNode>,
        slots: &SlotInputs,
    ) -> Result<Self, GraphError> {
        let mut bindings = HashMap::new();

        for slot in InputSlot::ALL {
            let input = slots.input_for(slot);
            let bound: Vec<SlotBinding> = nodes
                .iter()
                .filter(|(_, node)| {
                    node.inputs
                        .get(input)
                        .map(|value| !is_link(value))
                        .unwrap_or(false)
                })
                .map(|(node_id, _)| SlotBinding {
                    node_id: node_id.clone(),
                    input: input.to_string(),
                })
                .collect();

            if bound.is_empty() {
                return Err(GraphError::TemplateSlotMissing {
                    template: name.to_string(),
                    slot: slot.to_string(),
                    input: input.to_string(),
                });
            }
            bindings.insert(slot, bound);
        }

        Ok(Self {
            name: name.to_string(),
            nodes,
            bindings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &BTreeMap<String, GraphNode> {
        &self.nodes
    }

    /// Bindings recorded for a slot at load time.
    pub fn bindings(&self, slot: InputSlot) -> &[SlotBinding] {
        self.bindings.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A per-request copy of a template with resolved paths injected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GraphInstance {
    nodes: BTreeMap<String, GraphNode>,
}

impl GraphInstance {
    pub fn new(nodes: BTreeMap<String, GraphNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &BTreeMap<String, GraphNode> {
        &self.nodes
    }

    /// Reads a node input, mostly for assertions.
    pub fn input(&self, node_id: &str, input: &str) -> Option<&Value> {
        self.nodes.get(node_id)?.inputs.get(input)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut BTreeMap<String, GraphNode> {
        &mut self.nodes
    }
}

/// Local paths for every slot of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub audio: PathBuf,
    pub transcript: PathBuf,
    pub image: PathBuf,
}

impl ResolvedInputs {
    pub fn get(&self, slot: InputSlot) -> &Path {
        match slot {
            InputSlot::Audio => &self.audio,
            InputSlot::Transcript => &self.transcript,
            InputSlot::Image => &self.image,
        }
    }
}

/// `[node_id, output_index]` pairs connect nodes; everything else is a literal.
fn is_link(value: &Value) -> bool {
    match value.as_array() {
        Some(items) => items.len() == 2 && (items[0].is_string() || items[0].is_number()),
        None => false,
    }
}

/// Orders node ids numerically when both are integers, lexically otherwise.
pub fn compare_node_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
