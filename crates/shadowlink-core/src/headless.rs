//! Non-interactive link checking and repair
//!
//! Used when a project is opened without a UI (render farms, CI). Broken
//! source paths are retried with environment variables expanded.

use std::fmt;

use serde::{Deserialize, Serialize};
use shadowlink_fs::PathResolver;
use tracing::{info, warn};

use crate::loader::SourceLoader;
use crate::project::SourceDescriptor;

/// Counts from [`HeadlessFixer::auto_fix_broken_links`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFixStats {
    pub total: usize,
    /// Fixed, or fixable when run report-only
    pub fixed: usize,
    pub missing: usize,
    pub already_ok: usize,
}

/// One source in a library report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLine {
    pub name: String,
    pub path: String,
    pub exists: bool,
    /// Expanded path that would fix it, when one exists
    pub fix: Option<String>,
    /// Expanded path that was tried without success
    pub tried: Option<String>,
}

impl fmt::Display for LibraryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.exists { "✓" } else { "✗" };
        writeln!(f, "{mark} {}", self.name)?;
        write!(f, "  Path: {}", self.path)?;
        if let Some(fix) = &self.fix {
            write!(f, "\n  Can fix: {fix}")?;
        }
        if let Some(tried) = &self.tried {
            write!(f, "\n  Missing (tried: {tried})")?;
        }
        Ok(())
    }
}

enum LinkState {
    Ok,
    Fixable(String),
    Missing(String),
}

pub struct HeadlessFixer<'a> {
    paths: &'a PathResolver,
}

impl<'a> HeadlessFixer<'a> {
    pub fn new(paths: &'a PathResolver) -> Self {
        Self { paths }
    }

    fn state(&self, source: &SourceDescriptor) -> LinkState {
        if self.paths.absolutize(&source.path).exists() {
            return LinkState::Ok;
        }
        let expanded = self.paths.expand(&source.path);
        if self.paths.absolutize(&expanded).exists() {
            LinkState::Fixable(expanded)
        } else {
            LinkState::Missing(expanded)
        }
    }

    /// Retry every broken source with variables expanded.
    ///
    /// With `report_only` nothing is changed; fixable sources are still
    /// counted as fixed.
    pub fn auto_fix_broken_links(
        &self,
        sources: &mut [SourceDescriptor],
        loader: &mut dyn SourceLoader,
        report_only: bool,
    ) -> AutoFixStats {
        let mut stats = AutoFixStats {
            total: sources.len(),
            ..AutoFixStats::default()
        };

        for source in sources.iter_mut() {
            match self.state(source) {
                LinkState::Ok => stats.already_ok += 1,
                LinkState::Missing(tried) => {
                    warn!(source = %source.name, %tried, "Source missing");
                    stats.missing += 1;
                }
                LinkState::Fixable(expanded) if report_only => {
                    info!(source = %source.name, path = %expanded, "Can fix");
                    stats.fixed += 1;
                }
                LinkState::Fixable(expanded) => {
                    source.path = expanded;
                    let resolved = self.paths.absolutize(&source.path);
                    match loader.reload(source, &resolved) {
                        Ok(()) => {
                            info!(source = %source.name, path = %source.path, "Fixed");
                            stats.fixed += 1;
                        }
                        Err(e) => {
                            warn!(source = %source.name, error = %e, "Failed to reload");
                            stats.missing += 1;
                        }
                    }
                }
            }
        }

        info!(
            ok = stats.already_ok,
            fixed = stats.fixed,
            missing = stats.missing,
            "Library status"
        );
        stats
    }

    pub fn library_report(&self, sources: &[SourceDescriptor]) -> Vec<LibraryLine> {
        sources
            .iter()
            .map(|source| {
                let (exists, fix, tried) = match self.state(source) {
                    LinkState::Ok => (true, None, None),
                    LinkState::Fixable(path) => (false, Some(path), None),
                    LinkState::Missing(path) => (false, None, Some(path)),
                };
                LibraryLine {
                    name: source.name.clone(),
                    path: source.path.clone(),
                    exists,
                    fix,
                    tried,
                }
            })
            .collect()
    }

    /// True when every source exists as stored or after expansion.
    pub fn validate_all(&self, sources: &[SourceDescriptor]) -> bool {
        sources
            .iter()
            .all(|s| !matches!(self.state(s), LinkState::Missing(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FsLoader;
    use pretty_assertions::assert_eq;
    use shadowlink_fs::MapEnv;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathResolver, Vec<SourceDescriptor>) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ok.blend"), b"").unwrap();
        std::fs::write(temp.path().join("env.blend"), b"").unwrap();
        let paths = PathResolver::with_vars(
            MapEnv::new().with_var("PROJECT_DIR", temp.path().to_string_lossy()),
        );
        let sources = vec![
            SourceDescriptor::new("ok", temp.path().join("ok.blend").to_string_lossy()),
            SourceDescriptor::new("env", "${PROJECT_DIR}/env.blend"),
            SourceDescriptor::new("lost", "${PROJECT_DIR}/lost.blend"),
        ];
        (temp, paths, sources)
    }

    #[test]
    fn test_report_only_changes_nothing() {
        let (_temp, paths, mut sources) = setup();
        let before = sources.clone();
        let mut loader = FsLoader::default();

        let stats = HeadlessFixer::new(&paths).auto_fix_broken_links(&mut sources, &mut loader, true);

        assert_eq!(
            stats,
            AutoFixStats {
                total: 3,
                fixed: 1,
                missing: 1,
                already_ok: 1
            }
        );
        assert_eq!(sources, before);
    }

    #[test]
    fn test_fix_rewrites_expanded_path() {
        let (temp, paths, mut sources) = setup();
        let mut loader = FsLoader::default();
        let fixer = HeadlessFixer::new(&paths);

        let stats = fixer.auto_fix_broken_links(&mut sources, &mut loader, false);

        assert_eq!(stats.fixed, 1);
        assert_eq!(sources[1].path, format!("{}/env.blend", temp.path().to_string_lossy()));
        // Second pass finds it already fine
        let again = fixer.auto_fix_broken_links(&mut sources, &mut loader, false);
        assert_eq!((again.already_ok, again.fixed, again.missing), (2, 0, 1));
    }

    #[test]
    fn test_library_report_and_validation() {
        let (_temp, paths, sources) = setup();
        let fixer = HeadlessFixer::new(&paths);

        let lines = fixer.library_report(&sources);

        assert!(lines[0].exists);
        assert!(lines[1].fix.is_some());
        assert!(lines[2].tried.as_deref().unwrap().ends_with("lost.blend"));
        assert!(lines[2].to_string().starts_with("✗ lost\n  Path: ${PROJECT_DIR}/lost.blend"));
        assert!(!fixer.validate_all(&sources));
        assert!(fixer.validate_all(&sources[..2]));
    }
}
