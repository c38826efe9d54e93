//! Project snapshot discovery and the per-invocation session
//!
//! Like git, commands work from any directory below the project: the
//! nearest `shadowlink.toml` walking upwards is used unless a snapshot is
//! named explicitly.

use std::path::{Path, PathBuf};

use shadowlink_core::Session;
use tracing::debug;

use crate::error::{CliError, Result};

/// Snapshot file looked for when none is given.
pub const SNAPSHOT_FILE: &str = "shadowlink.toml";

/// Walk up from `cwd` looking for a snapshot.
pub fn find_snapshot(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .map(|dir| dir.join(SNAPSHOT_FILE))
        .find(|candidate| candidate.is_file())
}

/// An open project plus the output options of this invocation.
pub struct Context {
    pub session: Session,
    pub path: PathBuf,
    pub dry_run: bool,
    pub json: bool,
}

impl Context {
    pub fn open(explicit: Option<&Path>, cwd: &Path, dry_run: bool, json: bool) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => find_snapshot(cwd).ok_or_else(|| {
                CliError::user(format!(
                    "No {SNAPSHOT_FILE} found in {} or any parent directory",
                    cwd.display()
                ))
            })?,
        };
        if !path.is_file() {
            return Err(CliError::user(format!(
                "Project snapshot not found: {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), "Opening project");
        let session = Session::open(&path)?;
        Ok(Self {
            session,
            path,
            dry_run,
            json,
        })
    }

    /// Write the project back unless this is a dry run.
    pub fn save(&self) -> Result<()> {
        if self.dry_run {
            debug!("Dry run, not saving");
            return Ok(());
        }
        self.session.save(&self.path)?;
        Ok(())
    }

    /// Add every source whose name contains one of `patterns` to the
    /// registry selection.
    pub fn select(&mut self, patterns: &[String]) -> usize {
        let registry = self.session.registry_mut();
        let count = patterns
            .iter()
            .map(|pattern| registry.select_by_pattern(pattern))
            .sum();
        debug!(patterns = ?patterns, count, "Selected sources");
        count
    }

    /// Named sources, else the registry selection, else every source.
    pub fn source_ids(&self, ids: Vec<String>) -> Vec<String> {
        if !ids.is_empty() {
            return ids;
        }
        let selected = self.session.registry().selected_names();
        if !selected.is_empty() {
            return selected;
        }
        self.session
            .project()
            .sources
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Print `value` as pretty JSON.
    pub fn emit_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
