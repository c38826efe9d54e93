//! Per-instance copies of shared customization scripts
//!
//! Every instance of a linked rig starts out pointing at the same script.
//! Running that script against one instance would touch all of them, so each
//! instance gets a duplicate bound to its own name.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::library::{Script, ScriptLibrary};
use super::safety::validate_safety;
use crate::model::{OverrideShadow, ScriptBinding};
use crate::{Error, Result};

/// What a runner gets to see when executing a script.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Instance the script is scoped to
    pub owner: &'a OverrideShadow,
    pub script: &'a Script,
}

/// Host-provided script executor.
pub trait ScriptRunner: Send + Sync {
    /// Run the script; `Err` carries the host's error text.
    fn run(&self, context: &ExecutionContext<'_>) -> std::result::Result<(), String>;
}

/// Runner that accepts every script without running anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRunner;

impl ScriptRunner for NullRunner {
    fn run(&self, context: &ExecutionContext<'_>) -> std::result::Result<(), String> {
        debug!(script = %context.script.name, owner = %context.owner.name, "Null runner skipped script");
        Ok(())
    }
}

/// Result of [`ScriptIsolationManager::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Duplicates, binds and runs instance scripts.
pub struct ScriptIsolationManager {
    runner: Box<dyn ScriptRunner>,
    validate: bool,
}

impl ScriptIsolationManager {
    pub fn new(runner: impl ScriptRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
            validate: true,
        }
    }

    /// Toggle the safety scan before execution.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    pub fn validates(&self) -> bool {
        self.validate
    }

    /// Script bound to the rig in `owner`'s hierarchy, if it still exists.
    pub fn find_script<'a>(
        &self,
        owner: &OverrideShadow,
        library: &'a ScriptLibrary,
    ) -> Option<&'a Script> {
        let binding = owner.find_rig()?.script.as_ref()?;
        library.get(&binding.script)
    }

    /// `{original}_{instance}` with characters outside `[A-Za-z0-9_.-]`
    /// replaced by `_`.
    pub fn isolated_name(original: &str, instance: &str) -> String {
        format!("{original}_{instance}")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Copy `original` under a name unique to `instance` and bind it to the
    /// rig in `owner`'s hierarchy (or `owner` itself when it has no rig).
    ///
    /// An isolated copy already bound to the target is dropped from the
    /// library first, so isolating again replaces it instead of piling up
    /// copies. Returns the new script's name.
    pub fn isolate(
        &self,
        library: &mut ScriptLibrary,
        original: &str,
        owner: &mut OverrideShadow,
        instance: &str,
    ) -> Result<String> {
        let source = library
            .get(original)
            .cloned()
            .ok_or_else(|| Error::ScriptNotFound {
                name: original.to_string(),
            })?;

        let target = if owner.find_rig().is_some() {
            owner.find_rig_mut()
        } else {
            Some(owner)
        };
        let Some(target) = target else {
            return Err(Error::shadow_not_found(instance));
        };

        if let Some(previous) = target.script.as_ref()
            && previous.original.is_some()
            && previous.script != original
            && library.remove(&previous.script).is_some()
        {
            debug!(
                replaced = %previous.script,
                owner = %target.name,
                "Dropped previous isolated copy"
            );
        }

        let name = library.unique_name(&Self::isolated_name(original, instance));
        library.insert(Script::new(name.clone(), source.text));

        info!(original, isolated = %name, owner = %target.name, "Isolated script");
        target.script = Some(ScriptBinding {
            script: name.clone(),
            original: Some(original.to_string()),
        });
        Ok(name)
    }

    /// Run `script` scoped to `owner`.
    ///
    /// With validation enabled, a script with unsafe patterns is rejected
    /// without being handed to the runner.
    pub fn execute(&self, owner: &OverrideShadow, script: &Script) -> ExecutionOutcome {
        if self.validate {
            let flags = validate_safety(&script.text);
            if !flags.is_empty() {
                let listed: Vec<String> = flags.iter().map(ToString::to_string).collect();
                warn!(script = %script.name, flags = ?listed, "Refusing to run unsafe script");
                return ExecutionOutcome::failed(format!(
                    "unsafe operations: {}",
                    listed.join(", ")
                ));
            }
        }

        let context = ExecutionContext { owner, script };
        match self.runner.run(&context) {
            Ok(()) => ExecutionOutcome::ok(),
            Err(e) => {
                warn!(script = %script.name, owner = %owner.name, error = %e, "Script failed");
                ExecutionOutcome::failed(e)
            }
        }
    }
}

impl Default for ScriptIsolationManager {
    fn default() -> Self {
        Self::new(NullRunner)
    }
}

impl std::fmt::Debug for ScriptIsolationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptIsolationManager")
            .field("validate", &self.validate)
            .finish_non_exhaustive()
    }
}
