//! Skeletal rig data carried by rig shadows

use serde::{Deserialize, Serialize};

/// Per-axis lock flags for the three transform categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformLocks {
    #[serde(default)]
    pub location: [bool; 3],
    #[serde(default)]
    pub rotation: [bool; 3],
    #[serde(default)]
    pub scale: [bool; 3],
}

impl TransformLocks {
    /// Every axis of every category locked.
    pub const ALL: Self = Self {
        location: [true; 3],
        rotation: [true; 3],
        scale: [true; 3],
    };

    /// True when location, rotation and scale are all locked on every axis.
    pub fn fully_locked(&self) -> bool {
        self.location.iter().all(|l| *l)
            && self.rotation.iter().all(|l| *l)
            && self.scale.iter().all(|l| *l)
    }

    pub fn any_locked(&self) -> bool {
        self.location
            .iter()
            .chain(&self.rotation)
            .chain(&self.scale)
            .any(|l| *l)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Constraint types the engines distinguish.
///
/// Unrecognized types deserialize as [`ConstraintKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    CopyLocation,
    CopyRotation,
    CopyScale,
    CopyTransforms,
    ChildOf,
    TrackTo,
    DampedTrack,
    StretchTo,
    Ik,
    Armature,
    LimitLocation,
    LimitRotation,
    LimitScale,
    #[serde(other)]
    Other,
}

impl ConstraintKind {
    /// Limit constraints act without a target.
    pub fn is_limit(self) -> bool {
        matches!(
            self,
            Self::LimitLocation | Self::LimitRotation | Self::LimitScale
        )
    }
}

fn full_influence() -> f32 {
    1.0
}

/// A constraint on a joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "full_influence")]
    pub influence: f32,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
            target: None,
            muted: false,
            influence: 1.0,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    /// Active, targetless and not a limit constraint.
    pub fn is_missing_target(&self) -> bool {
        !self.muted && self.target.is_none() && !self.kind.is_limit()
    }
}

/// One node of a rig's pose hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    #[serde(default)]
    pub locks: TransformLocks,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Joint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locks: TransformLocks::default(),
            constraints: Vec::new(),
        }
    }

    pub fn with_locks(mut self, locks: TransformLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Pose data of a rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigData {
    #[serde(default)]
    pub joints: Vec<Joint>,
}

impl RigData {
    pub fn new(joints: Vec<Joint>) -> Self {
        Self { joints }
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Joints with every lock category fully set.
    pub fn fully_locked_count(&self) -> usize {
        self.joints
            .iter()
            .filter(|j| j.locks.fully_locked())
            .count()
    }

    /// Constraints that are active, have no target and are not limits.
    pub fn constraints_missing_targets(&self) -> usize {
        self.joints
            .iter()
            .flat_map(|j| &j.constraints)
            .filter(|c| c.is_missing_target())
            .count()
    }

    /// Clear the locks of every fully locked joint, returning how many.
    ///
    /// Joints with partial locks are left alone.
    pub fn unlock_fully_locked(&mut self) -> usize {
        let mut count = 0;
        for joint in &mut self.joints {
            if joint.locks.fully_locked() {
                joint.locks.clear();
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial() -> TransformLocks {
        TransformLocks {
            location: [true; 3],
            rotation: [true, false, true],
            scale: [true; 3],
        }
    }

    #[test]
    fn test_fully_locked_requires_every_axis() {
        assert!(TransformLocks::ALL.fully_locked());
        assert!(!partial().fully_locked());
        assert!(partial().any_locked());
        assert!(!TransformLocks::default().any_locked());
    }

    #[test]
    fn test_unlock_only_touches_fully_locked_joints() {
        let mut rig = RigData::new(vec![
            Joint::new("spine").with_locks(TransformLocks::ALL),
            Joint::new("neck").with_locks(partial()),
            Joint::new("head"),
        ]);

        assert_eq!(rig.unlock_fully_locked(), 1);
        assert!(!rig.joint("spine").unwrap().locks.any_locked());
        assert_eq!(rig.joint("neck").unwrap().locks, partial());
        assert_eq!(rig.unlock_fully_locked(), 0);
    }

    #[test]
    fn test_missing_targets_skip_limits_and_muted() {
        let rig = RigData::new(vec![
            Joint::new("hand")
                .with_constraint(Constraint::new("IK", ConstraintKind::Ik))
                .with_constraint(Constraint::new("Limit", ConstraintKind::LimitRotation))
                .with_constraint(Constraint::new("Muted", ConstraintKind::CopyRotation).muted())
                .with_constraint(
                    Constraint::new("Follow", ConstraintKind::ChildOf).with_target("root"),
                ),
        ]);

        assert_eq!(rig.constraints_missing_targets(), 1);
    }

    #[test]
    fn test_unknown_constraint_kind_deserializes_as_other() {
        let c: Constraint =
            serde_json::from_str(r#"{"name": "x", "kind": "shrinkwrap"}"#).unwrap();
        assert_eq!(c.kind, ConstraintKind::Other);
        assert_eq!(c.influence, 1.0);
    }
}
