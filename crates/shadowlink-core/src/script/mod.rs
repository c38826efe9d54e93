//! Customization scripts: storage, per-instance isolation and safety scanning

pub mod isolation;
pub mod library;
pub mod safety;

pub use isolation::{
    ExecutionContext, ExecutionOutcome, NullRunner, ScriptIsolationManager, ScriptRunner,
};
pub use library::{Script, ScriptLibrary};
pub use safety::{SafetyFlag, validate_safety};
