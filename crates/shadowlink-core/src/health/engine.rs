//! Diagnostic rules over override shadows
//!
//! Every check runs for every shadow; no check short-circuits another. The
//! engine holds no shadow state between runs: callers hand it the live
//! shadow set each time.

use shadowlink_fs::PathResolver;
use tracing::debug;

use super::report::{HealthReport, Issue, IssueKind, Severity, ShadowSummary};
use crate::model::OverrideShadow;
use crate::project::SourceDescriptor;

/// Checks shadows against their sources.
#[derive(Debug)]
pub struct HealthEngine<'a> {
    sources: &'a [SourceDescriptor],
    paths: &'a PathResolver,
    max_objects: usize,
}

impl<'a> HealthEngine<'a> {
    pub fn new(sources: &'a [SourceDescriptor], paths: &'a PathResolver) -> Self {
        Self {
            sources,
            paths,
            max_objects: 0,
        }
    }

    /// Inspect at most `max` shadows per run (0 = no cap).
    pub fn with_max_objects(mut self, max: usize) -> Self {
        self.max_objects = max;
        self
    }

    fn source_for(&self, shadow: &OverrideShadow) -> Option<&'a SourceDescriptor> {
        let name = shadow.reference.as_ref()?.source.as_deref()?;
        self.sources.iter().find(|s| s.name == name)
    }

    /// Full check of one shadow.
    pub fn check(&self, shadow: &OverrideShadow) -> HealthReport {
        let mut report = HealthReport::new(&shadow.name);

        // Reference
        match &shadow.reference {
            None => report.push(Issue::error(IssueKind::MissingReference, "reference missing")),
            Some(reference) => report.record("reference", reference.name.as_str()),
        }

        // Source
        if let Some(source) = self.source_for(shadow) {
            if self.paths.exists(&source.path) {
                report.record("source", source.name.as_str());
                report.record("source_path", source.path.as_str());
            } else {
                report.push(Issue::error(
                    IssueKind::SourceNotFound,
                    format!("source file not found: {}", source.path),
                ));
            }
        }

        // Editability
        report.record("editable_properties", shadow.editable.len());
        if shadow.editable.is_empty() {
            report.push(Issue::warning(
                IssueKind::NoEditableProperties,
                "no editable properties",
            ));
        }

        // Rig
        if let Some(rig) = shadow.rig() {
            let joints = rig.joint_count();
            let locked = rig.fully_locked_count();
            let missing_targets = rig.constraints_missing_targets();
            report.record("joint_count", joints);
            report.record("locked_joint_count", locked);
            report.record("constraint_issues", missing_targets);

            if joints == 0 {
                report.push(Issue::warning(IssueKind::NoPoseData, "rig has no pose data"));
            } else if locked * 2 > joints {
                report.push(Issue::warning(
                    IssueKind::ManyJointsLocked,
                    format!("many joints locked ({locked} of {joints})"),
                ));
            }
            if missing_targets > 0 {
                report.push(Issue::warning(
                    IssueKind::ConstraintsMissingTargets,
                    format!("{missing_targets} constraints missing targets"),
                ));
            }
        }

        // Script
        report.record("has_script", shadow.script.is_some());
        if let Some(binding) = &shadow.script {
            report.record("script", binding.script.as_str());
        }

        report.finish()
    }

    /// The narrower diagnosis used to drive repair.
    pub fn diagnose(&self, shadow: &OverrideShadow) -> Vec<Issue> {
        let mut issues = Vec::new();

        if shadow.reference.is_none() {
            issues.push(Issue::error(IssueKind::MissingReference, "reference missing"));
        }
        if let Some(source) = self.source_for(shadow)
            && !self.paths.exists(&source.path)
        {
            issues.push(Issue::error(
                IssueKind::SourceNotFound,
                format!("source file not found: {}", source.path),
            ));
        }
        if shadow.editable.is_empty() {
            issues.push(Issue::warning(
                IssueKind::NoEditableProperties,
                "no editable properties",
            ));
        }
        if shadow.system_override {
            issues.push(Issue::info(
                IssueKind::SystemOverride,
                "system-generated override, needs resync",
            ));
        }

        issues
    }

    /// Check every shadow in every hierarchy, respecting the object cap.
    pub fn run(&self, roots: &[OverrideShadow]) -> Vec<HealthReport> {
        let limit = match self.max_objects {
            0 => usize::MAX,
            max => max,
        };
        let reports: Vec<HealthReport> = roots
            .iter()
            .flat_map(|root| root.walk())
            .take(limit)
            .map(|shadow| self.check(shadow))
            .collect();
        debug!(checked = reports.len(), "Health check complete");
        reports
    }

    /// Shadows with at least one ERROR, with just those errors.
    pub fn find_broken(&self, roots: &[OverrideShadow]) -> Vec<(String, Vec<Issue>)> {
        roots
            .iter()
            .flat_map(|root| root.walk())
            .filter_map(|shadow| {
                let errors: Vec<Issue> = self
                    .diagnose(shadow)
                    .into_iter()
                    .filter(|i| i.severity == Severity::Error)
                    .collect();
                (!errors.is_empty()).then(|| (shadow.name.clone(), errors))
            })
            .collect()
    }

    pub fn summary(&self, shadow: &OverrideShadow) -> ShadowSummary {
        ShadowSummary {
            name: shadow.name.clone(),
            kind: shadow.kind.name().to_string(),
            has_reference: shadow.reference.is_some(),
            reference: shadow.reference.as_ref().map(|r| r.name.clone()),
            source: shadow.reference.as_ref().and_then(|r| r.source.clone()),
            editable_count: shadow.editable.len(),
            child_count: shadow.children().len(),
        }
    }
}
