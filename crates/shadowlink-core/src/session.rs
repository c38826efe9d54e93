//! The command surface consumed by UI and CLI wrappers
//!
//! A [`Session`] owns one open project and the resolvers configured from its
//! settings. Every mutating command refreshes the registry afterwards so
//! callers always read current state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shadowlink_fs::{PathResolver, VersionInfo, VersionResolver};
use tracing::{debug, info};

use crate::batch::{BatchOrchestrator, BatchSummary};
use crate::headless::{AutoFixStats, HeadlessFixer, LibraryLine};
use crate::health::{HealthEngine, HealthReport, HealthSummary, Issue, ShadowSummary};
use crate::loader::{FsLoader, SourceLoader};
use crate::model::{LinkedRef, OverrideShadow, ShadowKind, unique_instance_name};
use crate::project::Project;
use crate::registry::AssetRegistry;
use crate::repair::{RepairEngine, RepairReport};
use crate::resync::{ResyncMode, ResyncReport, resync};
use crate::script::{
    ExecutionOutcome, SafetyFlag, ScriptIsolationManager, ScriptRunner, validate_safety,
};
use crate::{Error, Result};

/// Result of promoting a linked object to an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoteOutcome {
    /// Name given to the new shadow
    pub name: String,
    pub editable_added: usize,
    /// Isolated script bound to the instance
    pub script: Option<String>,
    pub execution: Option<ExecutionOutcome>,
}

pub struct Session {
    project: Project,
    paths: PathResolver,
    versions: VersionResolver,
    registry: AssetRegistry,
    loader: Box<dyn SourceLoader>,
    scripts: ScriptIsolationManager,
}

impl Session {
    /// Session over an in-memory project, reading the process environment.
    pub fn new(project: Project) -> Self {
        let loader = FsLoader::new(project.upstream.iter().cloned());
        let mut session = Self {
            paths: PathResolver::system(),
            versions: VersionResolver::new(),
            registry: AssetRegistry::new(),
            loader: Box::new(loader),
            scripts: ScriptIsolationManager::default(),
            project,
        };
        session.apply_settings();
        session.refresh_registry();
        session
    }

    /// Load a snapshot; relative source paths resolve against its directory.
    pub fn open(path: &Path) -> Result<Self> {
        let project = Project::load(path)?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::new(project).with_paths(PathResolver::system().with_base_dir(base)))
    }

    pub fn with_paths(mut self, paths: PathResolver) -> Self {
        self.paths = paths;
        self.apply_settings();
        self.refresh_registry();
        self
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_runner(mut self, runner: impl ScriptRunner + 'static) -> Self {
        self.scripts = ScriptIsolationManager::new(runner);
        self.apply_settings();
        self
    }

    fn apply_settings(&mut self) {
        let settings = &self.project.settings;
        let paths = std::mem::take(&mut self.paths);
        self.paths = paths.with_expansion(settings.use_environment_variables);
        let scripts = std::mem::take(&mut self.scripts);
        self.scripts = scripts.with_validation(settings.validate_scripts);
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.project.save(path)
    }

    // Registry

    pub fn refresh_registry(&mut self) -> usize {
        let versions = self
            .project
            .settings
            .auto_detect_versions
            .then_some(&self.versions);
        self.registry
            .refresh(&self.project.sources, &self.project.shadows, &self.paths, versions)
    }

    pub fn detect_versions(&mut self, ids: &[String]) -> usize {
        self.registry.detect_versions(ids, &self.versions)
    }

    pub fn version_info(&self, source: &str) -> Result<VersionInfo> {
        let source = self
            .registry
            .get(source)
            .ok_or_else(|| Error::source_not_found(source))?;
        Ok(self.versions.info(&source.resolved_text()))
    }

    // Health and repair

    fn health(&self) -> HealthEngine<'_> {
        HealthEngine::new(&self.project.sources, &self.paths)
            .with_max_objects(self.project.settings.max_health_check_objects)
    }

    pub fn run_health_check(&self) -> Vec<HealthReport> {
        self.health().run(&self.project.shadows)
    }

    pub fn health_summary(&self) -> HealthSummary {
        HealthSummary::from_reports(&self.run_health_check())
    }

    pub fn find_broken(&self) -> Vec<(String, Vec<Issue>)> {
        self.health().find_broken(&self.project.shadows)
    }

    pub fn shadow_summary(&self, id: &str) -> Result<ShadowSummary> {
        let shadow = self
            .project
            .shadow(id)
            .ok_or_else(|| Error::shadow_not_found(id))?;
        Ok(self.health().summary(shadow))
    }

    pub fn repair(&mut self, id: &str) -> Result<RepairReport> {
        let health = HealthEngine::new(&self.project.sources, &self.paths);
        let engine = RepairEngine::new(&health, &self.project.scripts);
        let shadow = self
            .project
            .shadows
            .iter_mut()
            .find_map(|root| root.find_mut(id))
            .ok_or_else(|| Error::shadow_not_found(id))?;
        let report = engine.repair(shadow);
        self.refresh_registry();
        Ok(report)
    }

    /// Re-derive a shadow from its upstream structure.
    ///
    /// A missing reference or unavailable upstream is reported in the
    /// result, not as an error.
    pub fn resync(&mut self, id: &str, mode: ResyncMode) -> Result<ResyncReport> {
        let shadow = self
            .project
            .shadow(id)
            .ok_or_else(|| Error::shadow_not_found(id))?;
        let Some(reference) = shadow.reference.clone() else {
            return Ok(ResyncReport::failed(id, "shadow has no reference to resync from"));
        };
        let upstream = match self.loader.fetch_upstream(&reference) {
            Ok(upstream) => upstream,
            Err(e) => return Ok(ResyncReport::failed(id, e.to_string())),
        };

        let shadow = self
            .project
            .shadow_mut(id)
            .ok_or_else(|| Error::shadow_not_found(id))?;
        let report = resync(shadow, &upstream, mode);
        self.refresh_registry();
        Ok(report)
    }

    // Overrides

    /// Create an override for a linked object.
    ///
    /// `shared_script` names the customization script the linked asset
    /// ships with, if any.
    pub fn promote(
        &mut self,
        linked: LinkedRef,
        kind: ShadowKind,
        shared_script: Option<&str>,
    ) -> Result<PromoteOutcome> {
        let name = unique_instance_name(&linked.name, |n| self.project.has_shadow_named(n));
        let mut shadow = OverrideShadow::new(name.clone(), Some(linked)).with_kind(kind);
        let settings = self.project.settings.clone();

        let editable_added = if settings.auto_make_editable {
            shadow.make_all_editable()
        } else {
            0
        };

        let mut script = None;
        let mut execution = None;
        if settings.isolate_scripts
            && let Some(original) = shared_script
        {
            let isolated =
                self.scripts
                    .isolate(&mut self.project.scripts, original, &mut shadow, &name)?;
            if settings.auto_execute_scripts
                && let Some(text) = self.project.scripts.get(&isolated)
            {
                let owner = shadow.find_rig().unwrap_or(&shadow);
                execution = Some(self.scripts.execute(owner, text));
            }
            script = Some(isolated);
        }

        info!(shadow = %name, editable_added, "Promoted to override");
        self.project.shadows.push(shadow);
        self.refresh_registry();
        Ok(PromoteOutcome {
            name,
            editable_added,
            script,
            execution,
        })
    }

    pub fn clear_override(&mut self, id: &str) -> Result<OverrideShadow> {
        let removed = self.project.clear_override(id)?;
        self.refresh_registry();
        Ok(removed)
    }

    pub fn make_editable(&mut self, id: &str, path: &str) -> Result<bool> {
        self.project
            .shadow_mut(id)
            .ok_or_else(|| Error::shadow_not_found(id))?
            .make_editable(path)
    }

    // Scripts

    /// Give the shadow's rig its own copy of its script.
    pub fn isolate_script(&mut self, id: &str, instance: &str) -> Result<String> {
        let shadow = self
            .project
            .shadows
            .iter_mut()
            .find_map(|root| root.find_mut(id))
            .ok_or_else(|| Error::shadow_not_found(id))?;
        let binding = shadow
            .find_rig()
            .and_then(|rig| rig.script.clone())
            .or_else(|| shadow.script.clone())
            .ok_or_else(|| Error::invalid_argument(format!("{id} has no script attached")))?;
        let original = binding.original.unwrap_or(binding.script);

        self.scripts
            .isolate(&mut self.project.scripts, &original, shadow, instance)
    }

    /// Run the script bound to the shadow's rig.
    pub fn execute_script(&self, id: &str) -> Result<ExecutionOutcome> {
        let shadow = self
            .project
            .shadow(id)
            .ok_or_else(|| Error::shadow_not_found(id))?;
        let script = self
            .scripts
            .find_script(shadow, &self.project.scripts)
            .ok_or_else(|| Error::ScriptNotFound {
                name: format!("script bound to {id}"),
            })?;
        let owner = shadow.find_rig().unwrap_or(shadow);
        debug!(shadow = id, script = %script.name, "Executing script");
        Ok(self.scripts.execute(owner, script))
    }

    pub fn validate_script(&self, name: &str) -> Result<Vec<SafetyFlag>> {
        let script = self
            .project
            .scripts
            .get(name)
            .ok_or_else(|| Error::ScriptNotFound {
                name: name.to_string(),
            })?;
        Ok(validate_safety(&script.text))
    }

    // Sources

    fn batch(&mut self) -> BatchOrchestrator<'_> {
        BatchOrchestrator::new(
            &mut self.project.sources,
            &self.paths,
            &self.versions,
            self.loader.as_mut(),
        )
    }

    pub fn relocate(&mut self, source: &str, new_path: &str) -> Result<bool> {
        let ok = self.batch().relocate(source, new_path)?;
        self.refresh_registry();
        Ok(ok)
    }

    pub fn reload(&mut self, source: &str) -> Result<bool> {
        let ok = self.batch().reload(source)?;
        self.refresh_registry();
        Ok(ok)
    }

    pub fn batch_relink(&mut self, ids: &[String], search: &str, replace: &str) -> Result<BatchSummary> {
        let summary = self.batch().relink(ids, search, replace)?;
        self.refresh_registry();
        Ok(summary)
    }

    pub fn batch_reload(&mut self, ids: &[String]) -> BatchSummary {
        let summary = self.batch().reload_all(ids);
        self.refresh_registry();
        summary
    }

    pub fn batch_search_folder(
        &mut self,
        ids: &[String],
        directory: &Path,
        recursive: bool,
    ) -> Result<BatchSummary> {
        let summary = self.batch().search_folder(ids, directory, recursive)?;
        self.refresh_registry();
        Ok(summary)
    }

    pub fn bump_to_latest(&mut self, ids: &[String]) -> BatchSummary {
        let summary = self.batch().bump_to_latest(ids);
        self.refresh_registry();
        summary
    }

    // Headless

    pub fn auto_fix_broken_links(&mut self, report_only: bool) -> AutoFixStats {
        let stats = HeadlessFixer::new(&self.paths).auto_fix_broken_links(
            &mut self.project.sources,
            self.loader.as_mut(),
            report_only,
        );
        self.refresh_registry();
        stats
    }

    /// Run the on-load auto-fix when the project's settings ask for it.
    pub fn fix_on_load(&mut self) -> Option<AutoFixStats> {
        self.project
            .settings
            .auto_fix_on_load
            .then(|| self.auto_fix_broken_links(false))
    }

    pub fn library_report(&self) -> Vec<LibraryLine> {
        HeadlessFixer::new(&self.paths).library_report(&self.project.sources)
    }

    pub fn validate_all(&self) -> bool {
        HeadlessFixer::new(&self.paths).validate_all(&self.project.sources)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("sources", &self.project.sources.len())
            .field("shadows", &self.project.shadows.len())
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}
