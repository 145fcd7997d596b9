//! Named graph templates loaded from a directory.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::config::{GraphConfig, SlotInputs};
use super::error::GraphError;
use super::types::GraphTemplate;

/// Templates keyed by file stem, loaded once at startup.
///
/// Templates that fail validation are remembered with their error so a
/// request naming them gets that error instead of a generic "not found".
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, Result<Arc<GraphTemplate>, GraphError>>,
    default_template: String,
}

impl TemplateLibrary {
    /// Loads every `*.json` file in the configured directory.
    pub fn load(config: &GraphConfig) -> Result<Self, GraphError> {
        let dir = &config.template_dir;
        let entries =
            std::fs::read_dir(dir).map_err(|e| GraphError::io(dir.display().to_string(), &e))?;

        let mut templates = BTreeMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| GraphError::io(dir.display().to_string(), &e))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let loaded = Self::load_file(name, &path, &config.slots).map(Arc::new);
            match &loaded {
                Ok(_) => info!("Loaded graph template '{}'", name),
                Err(e) => warn!("Graph template '{}' is unusable: {}", name, e),
            }
            templates.insert(name.to_string(), loaded);
        }

        if templates.is_empty() {
            warn!("No graph templates found in {:?}", dir);
        }

        Ok(Self {
            templates,
            default_template: config.default_template.clone(),
        })
    }

    fn load_file(name: &str, path: &Path, slots: &SlotInputs) -> Result<GraphTemplate, GraphError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| GraphError::io(path.display().to_string(), &e))?;
        GraphTemplate::from_json(name, &json, slots)
    }

    /// Builds a library from in-memory templates.
    pub fn from_templates(
        templates: impl IntoIterator<Item = GraphTemplate>,
        default_template: impl Into<String>,
    ) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.name().to_string(), Ok(Arc::new(t))))
                .collect(),
            default_template: default_template.into(),
        }
    }

    /// Picks a template.
    ///
    /// A named template must exist. Without a name the configured default is
    /// used, falling back to the first template in name order.
    pub fn select(&self, name: Option<&str>) -> Result<Arc<GraphTemplate>, GraphError> {
        if let Some(name) = name {
            let name = name.strip_suffix(".json").unwrap_or(name);
            return match self.templates.get(name) {
                Some(entry) => entry.clone(),
                None => Err(GraphError::TemplateNotFound {
                    name: name.to_string(),
                }),
            };
        }

        if let Some(entry) = self.templates.get(&self.default_template) {
            return entry.clone();
        }

        match self.templates.iter().next() {
            Some((fallback, entry)) => {
                warn!(
                    "Default template '{}' not found, using '{}'",
                    self.default_template, fallback
                );
                entry.clone()
            }
            None => Err(GraphError::TemplateNotFound {
                name: self.default_template.clone(),
            }),
        }
    }

    /// Names of all templates, usable or not.
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
