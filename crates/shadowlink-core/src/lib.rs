//! Override maintenance engines for shadowlink
//!
//! A project links assets from external source files and keeps local
//! "override shadows" of some of them. This crate keeps those shadows
//! healthy:
//!
//! - **Health**: classify each shadow as healthy, warning or error
//! - **Repair**: apply the safe fixes and report the rest
//! - **Resync**: re-derive shadow structure from upstream
//! - **Sources**: registry of linked files with batch relink, search and version bump
//! - **Scripts**: per-instance copies of shared customization scripts
//! - **Headless**: non-interactive link fixing on load
//!
//! # Architecture
//!
//! ```text
//!                  CLI / host UI
//!                        |
//!                     Session
//!                        |
//!   +--------+-------+---+----+--------+----------+
//!   |        |       |        |        |          |
//! health  repair  resync   batch   headless   script
//!                        |
//!                  shadowlink-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use shadowlink_core::{Result, Session};
//!
//! fn example() -> Result<()> {
//!     let mut session = Session::open(std::path::Path::new("shadowlink.toml"))?;
//!     for (name, issues) in session.find_broken() {
//!         println!("{name}: {} issues", issues.len());
//!         session.repair(&name)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod headless;
pub mod health;
pub mod loader;
pub mod model;
pub mod project;
pub mod registry;
pub mod repair;
pub mod resync;
pub mod script;
pub mod session;

pub use batch::{BatchOrchestrator, BatchSummary, ItemOutcome, ItemStatus};
pub use config::Settings;
pub use error::{Error, Result};
pub use headless::{AutoFixStats, HeadlessFixer, LibraryLine};
pub use health::{
    HealthEngine, HealthReport, HealthStatus, HealthSummary, Issue, IssueKind, Severity,
    ShadowSummary,
};
pub use loader::{FsLoader, SourceLoader};
pub use model::{
    Constraint, ConstraintKind, Joint, LinkedRef, OverrideShadow, RigData, ScriptBinding,
    ShadowKind, TransformLocks,
};
pub use project::{Project, SourceDescriptor, UpstreamNode};
pub use registry::{AssetRegistry, AssetSource};
pub use repair::{RepairEngine, RepairReport};
pub use resync::{ResyncMode, ResyncReport, resync};
pub use script::{
    ExecutionContext, ExecutionOutcome, NullRunner, SafetyFlag, Script, ScriptIsolationManager,
    ScriptLibrary, ScriptRunner, validate_safety,
};
pub use session::{PromoteOutcome, Session};
