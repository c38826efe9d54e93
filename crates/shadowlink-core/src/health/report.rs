//! Health report types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a health issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Needs manual action; the shadow is broken
    Error,
    /// Auto-fixable configuration problem
    Warning,
    /// Advisory only
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

/// What a health issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingReference,
    SourceNotFound,
    NoEditableProperties,
    NoPoseData,
    ManyJointsLocked,
    ConstraintsMissingTargets,
    /// Host-generated override that wants a resync
    SystemOverride,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MissingReference => "missing_reference",
            Self::SourceNotFound => "source_not_found",
            Self::NoEditableProperties => "no_editable_properties",
            Self::NoPoseData => "no_pose_data",
            Self::ManyJointsLocked => "many_joints_locked",
            Self::ConstraintsMissingTargets => "constraints_missing_targets",
            Self::SystemOverride => "system_override",
        };
        write!(f, "{name}")
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn info(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: Severity::Info,
        }
    }
}

/// Overall state of one shadow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of checking one shadow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Shadow name
    pub shadow: String,
    pub status: HealthStatus,
    /// False when any ERROR issue exists
    pub healthy: bool,
    /// Every finding, in check order
    pub issues: Vec<Issue>,
    /// Messages of the WARNING-severity findings
    pub warnings: Vec<String>,
    pub info: BTreeMap<String, Value>,
}

impl HealthReport {
    pub(crate) fn new(shadow: impl Into<String>) -> Self {
        Self {
            shadow: shadow.into(),
            status: HealthStatus::Healthy,
            healthy: true,
            issues: Vec::new(),
            warnings: Vec::new(),
            info: BTreeMap::new(),
        }
    }

    pub(crate) fn push(&mut self, issue: Issue) {
        if issue.severity == Severity::Warning {
            self.warnings.push(issue.message.clone());
        }
        self.issues.push(issue);
    }

    pub(crate) fn record(&mut self, key: &str, value: impl Into<Value>) {
        self.info.insert(key.to_string(), value.into());
    }

    /// Derive `healthy` and `status` from the collected issues.
    pub(crate) fn finish(mut self) -> Self {
        self.healthy = !self.issues.iter().any(|i| i.severity == Severity::Error);
        self.status = if !self.healthy {
            HealthStatus::Error
        } else if !self.warnings.is_empty() {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };
        self
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    /// The first three finding messages joined with `"; "`.
    pub fn description(&self) -> String {
        if self.issues.is_empty() {
            return "No issues".to_string();
        }
        self.issues
            .iter()
            .take(3)
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Tally over a set of reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub warning: usize,
    pub error: usize,
}

impl HealthSummary {
    pub fn from_reports(reports: &[HealthReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match report.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Warning => summary.warning += 1,
                HealthStatus::Error => summary.error += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.error
    }
}

/// Quick facts about one shadow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowSummary {
    pub name: String,
    pub kind: String,
    pub has_reference: bool,
    pub reference: Option<String>,
    pub source: Option<String>,
    pub editable_count: usize,
    pub child_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_derives_status() {
        let report = HealthReport::new("a").finish();
        assert_eq!(report.status, HealthStatus::Healthy);

        let mut report = HealthReport::new("b");
        report.push(Issue::warning(IssueKind::NoEditableProperties, "no editable properties"));
        let report = report.finish();
        assert!(report.healthy);
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.warnings, vec!["no editable properties".to_string()]);

        let mut report = HealthReport::new("c");
        report.push(Issue::error(IssueKind::MissingReference, "reference missing"));
        let report = report.finish();
        assert!(!report.healthy);
        assert_eq!(report.status, HealthStatus::Error);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_description_takes_first_three() {
        let mut report = HealthReport::new("a");
        for n in 0..5 {
            report.push(Issue::warning(IssueKind::NoPoseData, format!("w{n}")));
        }
        assert_eq!(report.description(), "w0; w1; w2");
        assert_eq!(HealthReport::new("b").description(), "No issues");
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"WARNING\""
        );
    }
}
