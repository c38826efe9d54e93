//! Project snapshot: the host's live data as one document
//!
//! A snapshot carries everything the engines need from the host: settings,
//! the linked asset sources, the override shadows, the script library and
//! the upstream structure of linked objects (used by resync).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::model::{OverrideShadow, ShadowKind};
use crate::script::ScriptLibrary;
use crate::{Error, Result};

/// An asset source as the host stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    /// Stored path; may contain unexpanded variables
    pub path: String,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Structure of a linked object as it currently exists in its source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "ShadowKind::is_generic")]
    pub kind: ShadowKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UpstreamNode>,
}

impl UpstreamNode {
    pub fn new(name: impl Into<String>, kind: ShadowKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: UpstreamNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub shadows: Vec<OverrideShadow>,
    #[serde(default)]
    pub scripts: ScriptLibrary,
    #[serde(default)]
    pub upstream: Vec<UpstreamNode>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a snapshot (TOML, JSON or YAML by extension).
    pub fn load(path: &Path) -> Result<Self> {
        let project: Self = shadowlink_fs::document::load(path)?;
        project.validate().map_err(|e| Error::InvalidSnapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            sources = project.sources.len(),
            shadows = project.shadows.len(),
            "Loaded project snapshot"
        );
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        shadowlink_fs::document::save(path, self)?;
        Ok(())
    }

    /// Check name uniqueness and hierarchy shape.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(Error::DuplicateSource {
                    name: source.name.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for shadow in &self.shadows {
            if !seen.insert(shadow.name.as_str()) {
                return Err(Error::DuplicateShadow {
                    name: shadow.name.clone(),
                });
            }
            shadow.check_acyclic()?;
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn source_mut(&mut self, name: &str) -> Option<&mut SourceDescriptor> {
        self.sources.iter_mut().find(|s| s.name == name)
    }

    /// Find a shadow anywhere in any hierarchy.
    pub fn shadow(&self, name: &str) -> Option<&OverrideShadow> {
        self.shadows.iter().find_map(|root| root.find(name))
    }

    pub fn shadow_mut(&mut self, name: &str) -> Option<&mut OverrideShadow> {
        self.shadows.iter_mut().find_map(|root| root.find_mut(name))
    }

    /// Whether any shadow in any hierarchy has this name.
    pub fn has_shadow_named(&self, name: &str) -> bool {
        self.shadow(name).is_some()
    }

    pub fn upstream_for(&self, reference: &str) -> Option<&UpstreamNode> {
        self.upstream.iter().find(|u| u.name == reference)
    }

    /// Remove a shadow (and its subtree), reverting it to a pure link.
    pub fn clear_override(&mut self, name: &str) -> Result<OverrideShadow> {
        if let Some(index) = self.shadows.iter().position(|s| s.name == name) {
            return Ok(self.shadows.remove(index));
        }
        for root in &mut self.shadows {
            let mut removed = None;
            root.for_each_mut(&mut |shadow: &mut OverrideShadow| {
                if removed.is_none() {
                    removed = shadow.remove_child(name);
                }
            });
            if let Some(shadow) = removed {
                return Ok(shadow);
            }
        }
        Err(Error::shadow_not_found(name))
    }
}
