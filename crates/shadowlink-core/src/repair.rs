//! Corrective actions for diagnosed shadows
//!
//! Repair runs four passes in a fixed order. Each pass is attempted on its
//! own; a pass that cannot help records a failure and the rest still run.
//! Running repair twice performs no new fixes the second time.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::health::{HealthEngine, IssueKind};
use crate::model::OverrideShadow;
use crate::script::ScriptLibrary;

/// What a repair did and what it could not do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub shadow: String,
    /// Fixes performed, in order
    pub fixes: Vec<String>,
    /// Problems that need manual action
    pub failures: Vec<String>,
}

impl RepairReport {
    fn new(shadow: &str) -> Self {
        Self {
            shadow: shadow.to_string(),
            ..Self::default()
        }
    }

    fn fixed(&mut self, message: String) {
        info!(shadow = %self.shadow, fix = %message, "Repaired");
        self.fixes.push(message);
    }

    fn failed(&mut self, message: String) {
        warn!(shadow = %self.shadow, reason = %message, "Could not repair");
        self.failures.push(message);
    }

    /// True when nothing had to be changed.
    pub fn is_noop(&self) -> bool {
        self.fixes.is_empty()
    }
}

pub struct RepairEngine<'a> {
    health: &'a HealthEngine<'a>,
    scripts: &'a ScriptLibrary,
}

impl<'a> RepairEngine<'a> {
    pub fn new(health: &'a HealthEngine<'a>, scripts: &'a ScriptLibrary) -> Self {
        Self { health, scripts }
    }

    pub fn repair(&self, shadow: &mut OverrideShadow) -> RepairReport {
        let mut report = RepairReport::new(&shadow.name);
        let mut editability_ran = false;

        for issue in self.health.diagnose(shadow) {
            match issue.kind {
                IssueKind::NoEditableProperties => {
                    editability_ran = true;
                    let added = shadow.make_all_editable();
                    if added > 0 {
                        report.fixed(format!("Made {added} properties editable"));
                    }
                }
                IssueKind::MissingReference => report.failed(
                    "Cannot auto-repair missing reference: relink the asset manually".to_string(),
                ),
                IssueKind::SourceNotFound => report.failed(format!(
                    "Cannot auto-repair {}: relocate the source or search a folder for it",
                    issue.message
                )),
                IssueKind::SystemOverride => {
                    shadow.system_override = false;
                    report.fixed("Converted system override to editable override".to_string());
                }
                IssueKind::NoPoseData
                | IssueKind::ManyJointsLocked
                | IssueKind::ConstraintsMissingTargets => {}
            }
        }

        if !editability_ran {
            let added = shadow.make_all_editable();
            if added > 0 {
                report.fixed(format!("Made {added} properties editable"));
            }
        }

        let mut unlocked = 0;
        shadow.for_each_mut(&mut |s: &mut OverrideShadow| {
            if let Some(rig) = s.rig_mut() {
                unlocked += rig.unlock_fully_locked();
            }
        });
        if unlocked > 0 {
            report.fixed(format!("Unlocked {unlocked} fully locked joints"));
        }

        if let Some(message) = self.repair_script_reference(shadow) {
            report.fixed(message);
        }

        report
    }

    /// Restore or clear a script binding whose script no longer exists.
    fn repair_script_reference(&self, shadow: &mut OverrideShadow) -> Option<String> {
        let holder = if shadow.find_rig().is_some() {
            shadow.find_rig_mut()?
        } else {
            shadow
        };
        let binding = holder.script.as_mut()?;
        if self.scripts.contains(&binding.script) {
            return None;
        }

        let dangling = binding.script.clone();
        match binding.original.clone() {
            Some(original) if self.scripts.contains(&original) => {
                binding.script = original.clone();
                Some(format!(
                    "Restored script reference '{dangling}' to original '{original}'"
                ))
            }
            _ => {
                holder.script = None;
                Some(format!("Cleared dangling script reference '{dangling}'"))
            }
        }
    }
}
