//! Catalog of linked asset sources
//!
//! The registry is rebuilt from the host's source list on every refresh;
//! entries are replaced wholesale, never patched. Only the selection flag
//! survives a refresh.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shadowlink_fs::{PathResolver, VersionResolver, human_size, is_network_path};
use tracing::{debug, warn};

use crate::model::OverrideShadow;
use crate::project::SourceDescriptor;

/// One linked source file, enriched with on-disk facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSource {
    pub name: String,
    /// Path as stored by the host
    pub path: String,
    /// Expanded, absolute path
    pub resolved_path: PathBuf,
    pub exists: bool,
    pub size_bytes: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Shadows whose reference comes from this source
    pub override_count: usize,
    pub detected_version: Option<u32>,
    pub has_newer_version: bool,
    pub selected: bool,
}

impl AssetSource {
    /// Human-readable size, when the file exists.
    pub fn file_size(&self) -> Option<String> {
        self.size_bytes.map(human_size)
    }

    /// Resolved path as text.
    pub fn resolved_text(&self) -> String {
        self.resolved_path.to_string_lossy().into_owned()
    }
}

/// Number of shadows, across all hierarchies, referencing `source`.
pub fn count_overrides(shadows: &[OverrideShadow], source: &str) -> usize {
    shadows
        .iter()
        .flat_map(|root| root.walk())
        .filter(|shadow| shadow.references_source(source))
        .count()
}

#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    sources: Vec<AssetSource>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every entry from the host's current sources and shadows.
    ///
    /// Returns the number of entries.
    pub fn refresh(
        &mut self,
        descriptors: &[SourceDescriptor],
        shadows: &[OverrideShadow],
        paths: &PathResolver,
        versions: Option<&VersionResolver>,
    ) -> usize {
        let selected: BTreeSet<String> = self
            .sources
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.name.clone())
            .collect();

        self.sources = descriptors
            .iter()
            .map(|descriptor| {
                let mut source = scan(descriptor, shadows, paths);
                source.selected = selected.contains(&source.name);
                if let Some(versions) = versions {
                    fill_version(&mut source, versions);
                }
                source
            })
            .collect();

        debug!(count = self.sources.len(), "Refreshed asset registry");
        self.sources.len()
    }

    pub fn sources(&self) -> &[AssetSource] {
        &self.sources
    }

    pub fn get(&self, name: &str) -> Option<&AssetSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AssetSource> {
        self.sources.iter_mut().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn missing(&self) -> impl Iterator<Item = &AssetSource> {
        self.sources.iter().filter(|s| !s.exists)
    }

    /// Fill version fields for the named sources.
    ///
    /// Returns how many of them carry a version token.
    pub fn detect_versions(&mut self, names: &[String], versions: &VersionResolver) -> usize {
        let mut detected = 0;
        for source in self.sources.iter_mut().filter(|s| names.contains(&s.name)) {
            fill_version(source, versions);
            if source.detected_version.is_some() {
                detected += 1;
            }
        }
        detected
    }

    // Selection

    pub fn selected_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.name.clone())
            .collect()
    }

    /// Select exactly the named sources. Returns how many were found.
    pub fn select(&mut self, names: &[String]) -> usize {
        let mut found = 0;
        for source in &mut self.sources {
            source.selected = names.contains(&source.name);
            if source.selected {
                found += 1;
            }
        }
        found
    }

    pub fn select_all(&mut self) {
        self.sources.iter_mut().for_each(|s| s.selected = true);
    }

    pub fn deselect_all(&mut self) {
        self.sources.iter_mut().for_each(|s| s.selected = false);
    }

    /// Flip every source's selection.
    pub fn toggle_all(&mut self) {
        self.sources.iter_mut().for_each(|s| s.selected = !s.selected);
    }

    /// Add sources whose name contains `pattern` (case-insensitive) to the
    /// selection. Returns the number of matches.
    pub fn select_by_pattern(&mut self, pattern: &str) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        let needle = pattern.to_lowercase();
        let mut matched = 0;
        for source in &mut self.sources {
            if source.name.to_lowercase().contains(&needle) {
                source.selected = true;
                matched += 1;
            }
        }
        matched
    }
}

fn scan(
    descriptor: &SourceDescriptor,
    shadows: &[OverrideShadow],
    paths: &PathResolver,
) -> AssetSource {
    if is_network_path(&descriptor.path) {
        warn!(source = %descriptor.name, path = %descriptor.path, "Source lives on a network path; scans may be slow");
    }

    let resolved_path = paths.resolve(&descriptor.path);
    let stat = if resolved_path.is_file() {
        match shadowlink_fs::stat(&resolved_path) {
            Ok(stat) => Some(stat),
            Err(e) => {
                warn!(source = %descriptor.name, error = %e, "Could not read source metadata");
                None
            }
        }
    } else {
        None
    };

    AssetSource {
        name: descriptor.name.clone(),
        path: descriptor.path.clone(),
        exists: resolved_path.exists(),
        size_bytes: stat.map(|s| s.size_bytes),
        last_modified: stat.and_then(|s| s.last_modified),
        override_count: count_overrides(shadows, &descriptor.name),
        detected_version: None,
        has_newer_version: false,
        selected: false,
        resolved_path,
    }
}

fn fill_version(source: &mut AssetSource, versions: &VersionResolver) {
    let resolved = source.resolved_text();
    source.detected_version = versions.extract_version(&resolved);
    source.has_newer_version = versions.has_newer(&resolved);
}
