//! Graph module for loading processing-graph templates and parameterizing them.
//!
//! Templates are JSON files in the engine's API format: a map from node id to
//! `{class_type, inputs}`. At load time every template is checked for the
//! three input slots (audio, transcript, image) and the node inputs bound to
//! each slot are recorded. Per request, [`parameterize`] deep-copies the
//! template and writes the resolved local paths into those inputs.
//!
//! # Example
//!
//! ```ignore
//! use graphrelay_core::graph::{parameterize, GraphConfig, ResolvedInputs, TemplateLibrary};
//!
//! let library = TemplateLibrary::load(&GraphConfig::default())?;
//! let template = library.select(Some("talking_head"))?;
//! let graph = parameterize(&template, &ResolvedInputs {
//!     audio: "/cache/in/a.wav".into(),
//!     transcript: "/cache/in/t.txt".into(),
//!     image: "/cache/in/i.png".into(),
//! });
//! ```

mod config;
mod error;
mod library;
mod parameterize;
mod types;

pub use config::{GraphConfig, SlotInputs};
pub use error::GraphError;
pub use library::TemplateLibrary;
pub use parameterize::parameterize;
pub use types::{
    compare_node_ids, GraphInstance, GraphNode, GraphTemplate, InputSlot, ResolvedInputs,
    SlotBinding,
};
