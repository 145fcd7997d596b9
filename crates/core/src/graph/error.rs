//! Error types for the graph module.

use thiserror::Error;

/// Errors raised while loading or selecting graph templates.
///
/// All of these are configuration problems: none of them can be fixed by
/// retrying the request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// No template with this name is available.
    #[error("Graph template not found: {name}")]
    TemplateNotFound { name: String },

    /// The template has no input bound to a required slot.
    #[error("Graph template '{template}' has no '{input}' input for the {slot} slot")]
    TemplateSlotMissing {
        template: String,
        slot: String,
        input: String,
    },

    /// The template file is not a valid graph.
    #[error("Failed to parse graph template '{template}': {reason}")]
    Parse { template: String, reason: String },

    /// The template directory or file could not be read.
    #[error("Failed to read graph templates from {path}: {reason}")]
    Io { path: String, reason: String },
}

impl GraphError {
    pub fn parse(template: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            template: template.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
