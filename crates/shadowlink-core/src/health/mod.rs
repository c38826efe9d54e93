//! Override health checks

mod engine;
mod report;

pub use engine::HealthEngine;
pub use report::{
    HealthReport, HealthStatus, HealthSummary, Issue, IssueKind, Severity, ShadowSummary,
};
