//! Editable property paths per shadow kind
//!
//! A shadow only accepts property paths its schema lists. Identity fields
//! (`rna_type`, `name`) are never editable.

use super::rig::RigData;
use super::shadow::ShadowKind;

/// Fields that identify an object and can never be overridden.
pub const IDENTITY_PROPERTIES: &[&str] = &["rna_type", "name"];

/// Mutable object-level fields shared by every shadow kind.
pub const OBJECT_PROPERTIES: &[&str] = &[
    "location",
    "rotation_euler",
    "rotation_quaternion",
    "rotation_axis_angle",
    "rotation_mode",
    "scale",
    "delta_location",
    "delta_rotation_euler",
    "delta_scale",
    "parent",
    "hide_viewport",
    "hide_render",
    "hide_select",
    "display_type",
    "color",
    "pass_index",
];

/// Transform channels overridable on every rig joint.
pub const JOINT_CHANNELS: &[&str] = &[
    "location",
    "rotation_euler",
    "rotation_quaternion",
    "rotation_axis_angle",
    "scale",
];

/// `pose.joints["<joint>"].<channel>`
pub fn joint_channel_path(joint: &str, channel: &str) -> String {
    format!("pose.joints[\"{joint}\"].{channel}")
}

/// `pose.joints["<joint>"].constraints[<index>].influence`
pub fn constraint_influence_path(joint: &str, index: usize) -> String {
    format!("pose.joints[\"{joint}\"].constraints[{index}].influence")
}

/// The set of mutable property paths for one shadow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    paths: Vec<String>,
}

impl PropertySchema {
    /// Schema for a shadow of the given kind.
    pub fn for_kind(kind: &ShadowKind) -> Self {
        let mut paths: Vec<String> = OBJECT_PROPERTIES.iter().map(|p| p.to_string()).collect();
        if let ShadowKind::Rig(rig) = kind {
            paths.extend(rig_paths(rig));
        }
        Self { paths }
    }

    /// Every mutable path, object fields first, then joints in pose order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        !Self::is_identity(path) && self.paths.iter().any(|p| p == path)
    }

    /// Whether `path` ends in an identity field (`name`,
    /// `pose.joints["root"].name`).
    pub fn is_identity(path: &str) -> bool {
        let field = path.rsplit('.').next().unwrap_or(path);
        IDENTITY_PROPERTIES.contains(&field)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn rig_paths(rig: &RigData) -> Vec<String> {
    let mut paths = Vec::new();
    for joint in &rig.joints {
        for channel in JOINT_CHANNELS {
            paths.push(joint_channel_path(&joint.name, channel));
        }
        for index in 0..joint.constraints.len() {
            paths.push(constraint_influence_path(&joint.name, index));
        }
    }
    paths
}
