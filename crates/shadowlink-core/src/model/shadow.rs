//! Override shadows and their hierarchy

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::rig::RigData;
use super::schema::PropertySchema;
use crate::{Error, Result};

/// The linked node a shadow stands in for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedRef {
    /// Name of the linked object in its source file
    pub name: String,
    /// Name of the asset source the object comes from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LinkedRef {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Some(source.into()),
        }
    }
}

/// What a shadow is, as far as the engines care.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShadowKind {
    #[default]
    Generic,
    Rig(RigData),
}

impl ShadowKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Rig(_) => "rig",
        }
    }

    pub(crate) fn is_generic(&self) -> bool {
        matches!(self, Self::Generic)
    }
}

/// Script attached to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBinding {
    /// Script currently attached (usually the isolated copy)
    pub script: String,
    /// Shared script the isolated copy was made from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

/// A locally editable stand-in for a linked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideShadow {
    pub name: String,

    /// Linked node this shadow shadows; `None` means the link is broken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<LinkedRef>,

    /// Property paths that may be written locally
    #[serde(default)]
    pub editable: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "ShadowKind::is_generic")]
    pub kind: ShadowKind,

    /// Set by the host for overrides it generated itself
    #[serde(default)]
    pub system_override: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptBinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<OverrideShadow>,
}

impl OverrideShadow {
    pub fn new(name: impl Into<String>, reference: Option<LinkedRef>) -> Self {
        Self {
            name: name.into(),
            reference,
            editable: BTreeSet::new(),
            kind: ShadowKind::Generic,
            system_override: false,
            script: None,
            children: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ShadowKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn rig(&self) -> Option<&RigData> {
        match &self.kind {
            ShadowKind::Rig(rig) => Some(rig),
            ShadowKind::Generic => None,
        }
    }

    pub fn rig_mut(&mut self) -> Option<&mut RigData> {
        match &mut self.kind {
            ShadowKind::Rig(rig) => Some(rig),
            ShadowKind::Generic => None,
        }
    }

    pub fn is_rig(&self) -> bool {
        self.rig().is_some()
    }

    /// Whether this shadow's reference comes from the named source.
    pub fn references_source(&self, source: &str) -> bool {
        self.reference
            .as_ref()
            .and_then(|r| r.source.as_deref())
            .is_some_and(|s| s == source)
    }

    pub fn schema(&self) -> PropertySchema {
        PropertySchema::for_kind(&self.kind)
    }

    /// Add one property path to the allowlist.
    ///
    /// Returns `true` if the path was newly added. Identity fields and paths
    /// outside the schema are rejected.
    pub fn make_editable(&mut self, path: &str) -> Result<bool> {
        if PropertySchema::is_identity(path) {
            return Err(Error::IdentityProperty {
                shadow: self.name.clone(),
                path: path.to_string(),
            });
        }
        if !self.schema().contains(path) {
            return Err(Error::UnknownProperty {
                shadow: self.name.clone(),
                path: path.to_string(),
            });
        }
        Ok(self.editable.insert(path.to_string()))
    }

    /// Make every schema path editable on this shadow and all descendants.
    ///
    /// Returns the number of newly added paths; already present paths are
    /// not counted.
    pub fn make_all_editable(&mut self) -> usize {
        let mut added = 0;
        self.for_each_mut(&mut |shadow: &mut OverrideShadow| {
            for path in shadow.schema().paths() {
                if shadow.editable.insert(path.clone()) {
                    added += 1;
                }
            }
        });
        added
    }

    // Hierarchy

    pub fn children(&self) -> &[OverrideShadow] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [OverrideShadow] {
        &mut self.children
    }

    /// Attach a child subtree.
    ///
    /// Rejected when the subtree contains this shadow's name or repeats a
    /// name along one of its own branches.
    pub fn add_child(&mut self, child: OverrideShadow) -> Result<()> {
        child.check_acyclic()?;
        if child.walk().iter().any(|s| s.name == self.name) {
            return Err(Error::HierarchyCycle {
                name: self.name.clone(),
                parent: child.name.clone(),
            });
        }
        self.children.push(child);
        Ok(())
    }

    pub fn remove_child(&mut self, name: &str) -> Option<OverrideShadow> {
        let index = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(index))
    }

    /// Fail if a name repeats along any root-to-leaf branch.
    pub fn check_acyclic(&self) -> Result<()> {
        fn check<'a>(shadow: &'a OverrideShadow, ancestors: &mut Vec<&'a str>) -> Result<()> {
            if let Some(parent) = ancestors.last()
                && ancestors.contains(&shadow.name.as_str())
            {
                return Err(Error::HierarchyCycle {
                    name: shadow.name.clone(),
                    parent: parent.to_string(),
                });
            }
            ancestors.push(&shadow.name);
            for child in &shadow.children {
                check(child, ancestors)?;
            }
            ancestors.pop();
            Ok(())
        }
        check(self, &mut Vec::new())
    }

    /// Pre-order list of this shadow and its descendants.
    ///
    /// A subtree whose name already appears among its ancestors is skipped.
    pub fn walk(&self) -> Vec<&OverrideShadow> {
        fn collect<'a>(
            shadow: &'a OverrideShadow,
            ancestors: &mut Vec<&'a str>,
            out: &mut Vec<&'a OverrideShadow>,
        ) {
            if ancestors.contains(&shadow.name.as_str()) {
                warn!(shadow = %shadow.name, "Skipping repeated shadow in hierarchy walk");
                return;
            }
            out.push(shadow);
            ancestors.push(&shadow.name);
            for child in &shadow.children {
                collect(child, ancestors, out);
            }
            ancestors.pop();
        }

        let mut out = Vec::new();
        collect(self, &mut Vec::new(), &mut out);
        out
    }

    /// Mutable pre-order visit with the same repeat guard as [`walk`](Self::walk).
    pub fn for_each_mut<F: FnMut(&mut OverrideShadow)>(&mut self, f: &mut F) {
        fn visit<F: FnMut(&mut OverrideShadow)>(
            shadow: &mut OverrideShadow,
            ancestors: &mut Vec<String>,
            f: &mut F,
        ) {
            if ancestors.contains(&shadow.name) {
                warn!(shadow = %shadow.name, "Skipping repeated shadow in hierarchy walk");
                return;
            }
            f(shadow);
            ancestors.push(shadow.name.clone());
            for child in &mut shadow.children {
                visit(child, ancestors, f);
            }
            ancestors.pop();
        }

        visit(self, &mut Vec::new(), f);
    }

    pub fn find(&self, name: &str) -> Option<&OverrideShadow> {
        self.walk().into_iter().find(|s| s.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut OverrideShadow> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// First rig in the hierarchy, this shadow first.
    pub fn find_rig(&self) -> Option<&OverrideShadow> {
        self.walk().into_iter().find(|s| s.is_rig())
    }

    pub fn find_rig_mut(&mut self) -> Option<&mut OverrideShadow> {
        if self.is_rig() {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_rig_mut())
    }
}

/// `base`, or `base.001`, `base.002`, ... whichever is free first.
pub fn unique_instance_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}.{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
