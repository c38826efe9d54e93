//! Multi-source path and version operations
//!
//! A batch walks the caller's selection one item at a time. A failing item
//! is recorded and the batch moves on; nothing is rolled back, so a relink
//! that succeeds for three of five sources leaves those three relinked.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shadowlink_fs::{PathResolver, Rewrite, VersionResolver, file_name, find_by_name, replace_file_name, rewrite};
use tracing::{debug, info, warn};

use crate::loader::SourceLoader;
use crate::project::SourceDescriptor;
use crate::{Error, Result};

/// Outcome of one item in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Succeeded,
    Failed,
    Skipped,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "ok"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Source name
    pub id: String,
    pub status: ItemStatus,
    pub detail: String,
}

/// Tally plus per-item detail for a batch command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchSummary {
    fn record(&mut self, id: &str, status: ItemStatus, detail: impl Into<String>) {
        let detail = detail.into();
        match status {
            ItemStatus::Succeeded => {
                info!(source = id, %detail, "Batch item done");
                self.succeeded += 1;
            }
            ItemStatus::Failed => {
                warn!(source = id, %detail, "Batch item failed");
                self.failed += 1;
            }
            ItemStatus::Skipped => {
                warn!(source = id, %detail, "Batch item skipped");
                self.skipped += 1;
            }
        }
        self.outcomes.push(ItemOutcome {
            id: id.to_string(),
            status,
            detail,
        });
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome(&self, id: &str) -> Option<&ItemOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// Applies path operations to a set of sources.
pub struct BatchOrchestrator<'a> {
    sources: &'a mut [SourceDescriptor],
    paths: &'a PathResolver,
    versions: &'a VersionResolver,
    loader: &'a mut dyn SourceLoader,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        sources: &'a mut [SourceDescriptor],
        paths: &'a PathResolver,
        versions: &'a VersionResolver,
        loader: &'a mut dyn SourceLoader,
    ) -> Self {
        Self {
            sources,
            paths,
            versions,
            loader,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name == name)
    }

    /// Point a source at `new_path`, then reload it.
    ///
    /// The new path is kept even when the reload fails.
    pub fn relocate(&mut self, name: &str, new_path: &str) -> Result<bool> {
        let index = self
            .index_of(name)
            .ok_or_else(|| Error::source_not_found(name))?;
        Ok(self.relocate_at(index, new_path).is_ok())
    }

    pub fn reload(&mut self, name: &str) -> Result<bool> {
        let index = self
            .index_of(name)
            .ok_or_else(|| Error::source_not_found(name))?;
        Ok(self.reload_at(index).is_ok())
    }

    fn relocate_at(&mut self, index: usize, new_path: &str) -> std::result::Result<(), String> {
        let source = &mut self.sources[index];
        debug!(source = %source.name, from = %source.path, to = new_path, "Relocating");
        source.path = new_path.to_string();
        self.reload_at(index)
    }

    fn reload_at(&mut self, index: usize) -> std::result::Result<(), String> {
        let source = &self.sources[index];
        let resolved = self.paths.resolve(&source.path);
        self.loader.reload(source, &resolved).map_err(|e| {
            warn!(source = %source.name, error = %e, "Reload failed");
            e.to_string()
        })
    }

    /// Substitute `search` with `replace` in each source's stored path.
    ///
    /// Sources whose path lacks `search` are skipped, not failed.
    pub fn relink(&mut self, names: &[String], search: &str, replace: &str) -> Result<BatchSummary> {
        if search.is_empty() {
            return Err(Error::invalid_argument("search string cannot be empty"));
        }
        if names.is_empty() {
            return Err(Error::invalid_argument("no sources selected"));
        }

        let mut summary = BatchSummary::default();
        for name in names {
            let Some(index) = self.index_of(name) else {
                summary.record(name, ItemStatus::Failed, "unknown source");
                continue;
            };
            match rewrite(&self.sources[index].path, search, replace) {
                Rewrite::Skipped => {
                    summary.record(name, ItemStatus::Skipped, format!("'{search}' not in path"));
                }
                Rewrite::Rewritten(new_path) => match self.relocate_at(index, &new_path) {
                    Ok(()) => summary.record(name, ItemStatus::Succeeded, new_path),
                    Err(e) => summary.record(name, ItemStatus::Failed, e),
                },
            }
        }
        Ok(summary)
    }

    /// Reload each named source.
    pub fn reload_all(&mut self, names: &[String]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for name in names {
            let Some(index) = self.index_of(name) else {
                summary.record(name, ItemStatus::Failed, "unknown source");
                continue;
            };
            match self.reload_at(index) {
                Ok(()) => summary.record(name, ItemStatus::Succeeded, "reloaded"),
                Err(e) => summary.record(name, ItemStatus::Failed, e),
            }
        }
        summary
    }

    /// Look for each source's file name under `directory` and relocate to
    /// the first match.
    pub fn search_folder(
        &mut self,
        names: &[String],
        directory: &Path,
        recursive: bool,
    ) -> Result<BatchSummary> {
        if !directory.is_dir() {
            return Err(shadowlink_fs::Error::NotADirectory {
                path: directory.to_path_buf(),
            }
            .into());
        }
        if names.is_empty() {
            return Err(Error::invalid_argument("no sources selected"));
        }

        let mut summary = BatchSummary::default();
        for name in names {
            let Some(index) = self.index_of(name) else {
                summary.record(name, ItemStatus::Failed, "unknown source");
                continue;
            };
            let wanted = file_name(&self.sources[index].path).to_string();
            let Some(found) = find_by_name(directory, &wanted, recursive) else {
                summary.record(
                    name,
                    ItemStatus::Failed,
                    format!("{wanted} not found under {}", directory.display()),
                );
                continue;
            };
            let found = found.to_string_lossy().into_owned();
            match self.relocate_at(index, &found) {
                Ok(()) => summary.record(name, ItemStatus::Succeeded, found),
                Err(e) => summary.record(name, ItemStatus::Failed, e),
            }
        }
        Ok(summary)
    }

    /// Move each source to the highest version found next to it.
    ///
    /// Only the file name changes; the stored directory text (including
    /// unexpanded variables) is kept. Sources without a newer version are
    /// skipped.
    pub fn bump_to_latest(&mut self, names: &[String]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for name in names {
            let Some(index) = self.index_of(name) else {
                summary.record(name, ItemStatus::Failed, "unknown source");
                continue;
            };
            let resolved = self
                .paths
                .resolve(&self.sources[index].path)
                .to_string_lossy()
                .into_owned();
            if !self.versions.has_newer(&resolved) {
                summary.record(name, ItemStatus::Skipped, "no newer version");
                continue;
            }

            let latest = self.versions.latest(&resolved);
            let new_path = replace_file_name(&self.sources[index].path, file_name(&latest.path));
            let detail = match (self.versions.extract_version(&resolved), latest.version) {
                (Some(from), Some(to)) => format!("v{from:02} -> v{to:02}"),
                _ => new_path.clone(),
            };
            match self.relocate_at(index, &new_path) {
                Ok(()) => summary.record(name, ItemStatus::Succeeded, detail),
                Err(e) => summary.record(name, ItemStatus::Failed, e),
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FsLoader;
    use pretty_assertions::assert_eq;
    use shadowlink_fs::MapEnv;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_relink_rejects_empty_search() {
        let mut sources = vec![SourceDescriptor::new("a", "a.blend")];
        let paths = PathResolver::with_vars(MapEnv::new());
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        assert!(matches!(
            batch.relink(&names(&["a"]), "", "x"),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_relink_counts_success_skip_and_failure() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("old");
        let new = temp.path().join("new");
        touch(&new, "hero.blend");
        let mut sources = vec![
            SourceDescriptor::new("hero", format!("{}/hero.blend", old.display())),
            SourceDescriptor::new("gone", format!("{}/gone.blend", old.display())),
            SourceDescriptor::new("elsewhere", "/library/prop.blend"),
        ];
        let paths = PathResolver::with_vars(MapEnv::new());
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        let summary = batch
            .relink(
                &names(&["hero", "gone", "elsewhere", "ghost"]),
                &old.to_string_lossy(),
                &new.to_string_lossy(),
            )
            .unwrap();

        assert_eq!((summary.succeeded, summary.failed, summary.skipped), (1, 2, 1));
        assert_eq!(summary.outcome("elsewhere").unwrap().status, ItemStatus::Skipped);
        assert_eq!(summary.outcome("ghost").unwrap().detail, "unknown source");
        // No rollback: the failed reload still leaves the rewritten path
        assert!(sources[1].path.starts_with(&*new.to_string_lossy()));
        assert_eq!(sources[2].path, "/library/prop.blend");
    }

    #[test]
    fn test_search_folder_finds_nested_file() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("chars/hero"), "hero_v01.blend");
        let mut sources = vec![
            SourceDescriptor::new("hero", r"S:\chars\hero_v01.blend"),
            SourceDescriptor::new("prop", r"S:\props\crate.blend"),
        ];
        let paths = PathResolver::with_vars(MapEnv::new());
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        let summary = batch
            .search_folder(&names(&["hero", "prop"]), temp.path(), true)
            .unwrap();

        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        assert!(sources[0].path.ends_with("hero_v01.blend"));
        assert!(!sources[0].path.starts_with("S:"));
    }

    #[test]
    fn test_search_folder_non_recursive_misses_nested_file() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("chars"), "hero_v01.blend");
        let mut sources = vec![SourceDescriptor::new("hero", "/old/hero_v01.blend")];
        let paths = PathResolver::with_vars(MapEnv::new());
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        let summary = batch
            .search_folder(&names(&["hero"]), temp.path(), false)
            .unwrap();
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_search_folder_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let mut sources = vec![SourceDescriptor::new("hero", "hero.blend")];
        let paths = PathResolver::with_vars(MapEnv::new());
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        assert!(batch
            .search_folder(&names(&["hero"]), &temp.path().join("nope"), true)
            .is_err());
    }

    #[test]
    fn test_bump_keeps_variable_prefix() {
        let temp = TempDir::new().unwrap();
        for name in ["hero_v01.blend", "hero_v02.blend", "hero_v10.blend", "set_v03.blend"] {
            touch(temp.path(), name);
        }
        let mut sources = vec![
            SourceDescriptor::new("hero", "${SHOW}/hero_v01.blend"),
            SourceDescriptor::new("set", "${SHOW}/set_v03.blend"),
        ];
        let paths = PathResolver::with_vars(
            MapEnv::new().with_var("SHOW", temp.path().to_string_lossy()),
        );
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        let summary = batch.bump_to_latest(&names(&["hero", "set"]));

        assert_eq!((summary.succeeded, summary.skipped), (1, 1));
        assert_eq!(summary.outcome("hero").unwrap().detail, "v01 -> v10");
        assert_eq!(sources[0].path, "${SHOW}/hero_v10.blend");
        assert_eq!(sources[1].path, "${SHOW}/set_v03.blend");
    }

    #[test]
    fn test_reload_all_reports_missing_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.blend");
        let mut sources = vec![
            SourceDescriptor::new("a", "a.blend"),
            SourceDescriptor::new("b", "b.blend"),
        ];
        let paths = PathResolver::with_vars(MapEnv::new()).with_base_dir(temp.path());
        let versions = VersionResolver::new();
        let mut loader = FsLoader::default();
        let mut batch = BatchOrchestrator::new(&mut sources, &paths, &versions, &mut loader);

        let summary = batch.reload_all(&names(&["a", "b"]));
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        assert!(batch.reload("a").unwrap());
        assert!(!batch.reload("b").unwrap());
        assert!(batch.reload("zzz").is_err());
    }
}
