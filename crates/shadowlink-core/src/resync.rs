//! Re-deriving shadow structure from upstream data

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Joint, OverrideShadow, RigData, ShadowKind};
use crate::project::UpstreamNode;

/// How far a resync reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResyncMode {
    /// Only the named shadow
    #[default]
    Single,
    /// The shadow and its children, matched to upstream children by name
    Hierarchy,
}

/// Changes made by a resync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncReport {
    pub shadow: String,
    /// Shadows whose structure was re-derived
    pub resynced: Vec<String>,
    /// Editable paths dropped because upstream no longer has them
    pub dropped_properties: usize,
    pub joints_added: usize,
    pub joints_removed: usize,
    /// Children without an upstream counterpart, left untouched
    pub unmatched: Vec<String>,
    /// Why the resync could not run at all
    pub error: Option<String>,
}

impl ResyncReport {
    pub fn failed(shadow: &str, error: impl Into<String>) -> Self {
        Self {
            shadow: shadow.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Reconcile `shadow` with `upstream`.
///
/// Local lock settings survive for joints that still exist upstream;
/// everything structural comes from upstream.
pub fn resync(shadow: &mut OverrideShadow, upstream: &UpstreamNode, mode: ResyncMode) -> ResyncReport {
    let mut report = ResyncReport {
        shadow: shadow.name.clone(),
        ..ResyncReport::default()
    };
    resync_node(shadow, upstream, mode, &mut report);
    debug!(
        shadow = %report.shadow,
        resynced = report.resynced.len(),
        dropped = report.dropped_properties,
        "Resync complete"
    );
    report
}

fn resync_node(
    shadow: &mut OverrideShadow,
    upstream: &UpstreamNode,
    mode: ResyncMode,
    report: &mut ResyncReport,
) {
    shadow.kind = match (&shadow.kind, &upstream.kind) {
        (ShadowKind::Rig(local), ShadowKind::Rig(remote)) => {
            ShadowKind::Rig(merge_rig(local, remote, report))
        }
        (_, remote) => {
            if let ShadowKind::Rig(rig) = remote {
                report.joints_added += rig.joint_count();
            }
            if let ShadowKind::Rig(rig) = &shadow.kind {
                report.joints_removed += rig.joint_count();
            }
            remote.clone()
        }
    };

    let schema = shadow.schema();
    let before = shadow.editable.len();
    shadow.editable.retain(|path| schema.contains(path));
    report.dropped_properties += before - shadow.editable.len();

    shadow.system_override = false;
    report.resynced.push(shadow.name.clone());

    if mode == ResyncMode::Hierarchy {
        for child in shadow.children_mut() {
            let key = child
                .reference
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_else(|| child.name.clone());
            match upstream.children.iter().find(|u| u.name == key) {
                Some(node) => resync_node(child, node, mode, report),
                None => {
                    warn!(child = %child.name, "No upstream counterpart for child");
                    report.unmatched.push(child.name.clone());
                }
            }
        }
    }
}

fn merge_rig(local: &RigData, remote: &RigData, report: &mut ResyncReport) -> RigData {
    let joints: Vec<Joint> = remote
        .joints
        .iter()
        .map(|joint| {
            let mut merged = joint.clone();
            match local.joint(&joint.name) {
                Some(existing) => merged.locks = existing.locks,
                None => report.joints_added += 1,
            }
            merged
        })
        .collect();
    report.joints_removed += local
        .joints
        .iter()
        .filter(|j| remote.joint(&j.name).is_none())
        .count();
    RigData::new(joints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinkedRef, TransformLocks, joint_channel_path};
    use pretty_assertions::assert_eq;

    fn local_rig() -> OverrideShadow {
        let mut shadow = OverrideShadow::new("hero_rig", Some(LinkedRef::new("hero_rig", "hero")))
            .with_kind(ShadowKind::Rig(RigData::new(vec![
                Joint::new("root").with_locks(TransformLocks::ALL),
                Joint::new("tail"),
            ])));
        shadow.make_all_editable();
        shadow.system_override = true;
        shadow
    }

    fn upstream_rig() -> UpstreamNode {
        UpstreamNode::new(
            "hero_rig",
            ShadowKind::Rig(RigData::new(vec![Joint::new("root"), Joint::new("head")])),
        )
    }

    #[test]
    fn test_resync_rederives_joints_and_keeps_local_locks() {
        let mut shadow = local_rig();

        let report = resync(&mut shadow, &upstream_rig(), ResyncMode::Single);

        assert!(report.succeeded());
        assert_eq!(report.joints_added, 1);
        assert_eq!(report.joints_removed, 1);
        let rig = shadow.rig().unwrap();
        let names: Vec<_> = rig.joints.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["root", "head"]);
        assert_eq!(rig.joint("root").unwrap().locks, TransformLocks::ALL);
        assert!(!shadow.system_override);
    }

    #[test]
    fn test_resync_drops_paths_missing_upstream() {
        let mut shadow = local_rig();

        let report = resync(&mut shadow, &upstream_rig(), ResyncMode::Single);

        // Five channels on the vanished "tail" joint
        assert_eq!(report.dropped_properties, 5);
        assert!(!shadow.editable.contains(&joint_channel_path("tail", "scale")));
        assert!(shadow.editable.contains(&joint_channel_path("root", "scale")));
    }

    #[test]
    fn test_hierarchy_mode_matches_children_by_reference() {
        let mut root = OverrideShadow::new("hero", Some(LinkedRef::new("hero", "hero")));
        root.add_child(local_rig()).unwrap();
        root.add_child(OverrideShadow::new("extra", Some(LinkedRef::new("extra", "hero"))))
            .unwrap();
        let upstream = UpstreamNode::new("hero", ShadowKind::Generic).with_child(upstream_rig());

        let single = resync(&mut root.clone(), &upstream, ResyncMode::Single);
        assert_eq!(single.resynced, vec!["hero".to_string()]);

        let report = resync(&mut root, &upstream, ResyncMode::Hierarchy);
        assert_eq!(report.resynced, vec!["hero".to_string(), "hero_rig".to_string()]);
        assert_eq!(report.unmatched, vec!["extra".to_string()]);
        assert!(!root.children()[0].system_override);
    }

    #[test]
    fn test_rig_becoming_generic_drops_joint_paths() {
        let mut shadow = local_rig();
        let upstream = UpstreamNode::new("hero_rig", ShadowKind::Generic);

        let report = resync(&mut shadow, &upstream, ResyncMode::Single);

        assert!(!shadow.is_rig());
        assert_eq!(report.joints_removed, 2);
        assert!(shadow.editable.iter().all(|p| !p.starts_with("pose.")));
    }
}
