//! Path resolution for stored asset paths
//!
//! Stored source paths may carry unexpanded variables (`${NAME}`, `$NAME`,
//! `%NAME%`), a leading `~`, be relative to the project directory, or use
//! Windows separators while being inspected on another platform. The helpers
//! here turn them into something the filesystem understands without ever
//! failing: unresolvable tokens are left verbatim.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;
use walkdir::WalkDir;

use crate::env::{SystemEnv, VarSource};

/// `${NAME}` | `$NAME` | `%NAME%`
static VAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_]*)|%([A-Za-z_][A-Za-z0-9_()]*)%").unwrap()
});

/// Expands and absolutizes stored asset paths.
pub struct PathResolver {
    vars: Box<dyn VarSource>,
    base_dir: Option<PathBuf>,
    expand_vars: bool,
}

impl PathResolver {
    /// Resolver backed by the process environment.
    pub fn system() -> Self {
        Self::with_vars(SystemEnv)
    }

    /// Resolver backed by a custom variable source.
    pub fn with_vars(vars: impl VarSource + 'static) -> Self {
        Self {
            vars: Box::new(vars),
            base_dir: None,
            expand_vars: true,
        }
    }

    /// Directory that relative paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Enable or disable variable and `~` expansion.
    pub fn with_expansion(mut self, enabled: bool) -> Self {
        self.expand_vars = enabled;
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn expands_variables(&self) -> bool {
        self.expand_vars
    }

    /// Expand variable tokens and a leading home-directory token.
    ///
    /// Tokens whose variable is not set are kept as written.
    pub fn expand(&self, path: &str) -> String {
        if !self.expand_vars {
            return path.to_string();
        }

        let expanded = VAR_TOKEN.replace_all(path, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match self.vars.var(name) {
                Some(value) => value,
                None => caps[0].to_string(),
            }
        });

        self.expand_home(&expanded)
    }

    fn expand_home(&self, path: &str) -> String {
        let Some(rest) = path.strip_prefix('~') else {
            return path.to_string();
        };
        if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
            // `~user` forms are not supported
            return path.to_string();
        }
        match self.vars.home_dir() {
            Some(home) => format!("{}{}", home.to_string_lossy(), rest),
            None => path.to_string(),
        }
    }

    /// Make a path absolute without expanding variables.
    ///
    /// Relative paths are joined onto the base directory when one is set.
    /// Existing paths are canonicalized.
    pub fn absolutize(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        let joined = match (&self.base_dir, candidate.is_relative()) {
            (Some(base), true) => base.join(candidate),
            _ => candidate,
        };
        if joined.exists() {
            dunce::canonicalize(&joined).unwrap_or(joined)
        } else {
            joined
        }
    }

    /// Expand, then absolutize.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.absolutize(&self.expand(path))
    }

    /// Whether the expanded, absolutized path exists.
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("base_dir", &self.base_dir)
            .field("expand_vars", &self.expand_vars)
            .finish_non_exhaustive()
    }
}

/// Outcome of a find/replace over a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// The search text was found and replaced.
    Rewritten(String),
    /// The search text does not occur in the path; nothing changed.
    Skipped,
}

/// Literal substring substitution over a stored path.
///
/// An empty search string never matches.
pub fn rewrite(path: &str, search: &str, replace: &str) -> Rewrite {
    if search.is_empty() || !path.contains(search) {
        return Rewrite::Skipped;
    }
    Rewrite::Rewritten(path.replace(search, replace))
}

/// Find a file by exact name inside `directory`.
///
/// The first match wins. With `recursive`, the order is whatever the
/// directory walk yields, so callers must not rely on which of several
/// duplicates is returned. Unreadable entries are skipped.
pub fn find_by_name(directory: &Path, filename: &str, recursive: bool) -> Option<PathBuf> {
    if !directory.is_dir() {
        debug!(directory = %directory.display(), "search directory does not exist");
        return None;
    }

    if !recursive {
        let candidate = directory.join(filename);
        return candidate.is_file().then_some(candidate);
    }

    let wanted = OsStr::new(filename);
    WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .find(|entry| entry.file_type().is_file() && entry.file_name() == wanted)
        .map(|entry| entry.into_path())
}

fn last_separator(path: &str) -> Option<usize> {
    path.rfind(|c: char| c == '/' || c == '\\')
}

/// File name component of a stored path, splitting on `/` and `\`.
pub fn file_name(path: &str) -> &str {
    match last_separator(path) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Swap the file name of a stored path, keeping its directory text as written.
pub fn replace_file_name(path: &str, new_name: &str) -> String {
    match last_separator(path) {
        Some(idx) => format!("{}{}", &path[..=idx], new_name),
        None => new_name.to_string(),
    }
}

/// UNC and remote-share forms. These still resolve, but scans may be slow.
pub fn is_network_path(path: &str) -> bool {
    path.starts_with("//")
        || path.starts_with("\\\\")
        || path.starts_with("smb://")
        || path.starts_with("nfs://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use rstest::rstest;

    fn resolver() -> PathResolver {
        PathResolver::with_vars(
            MapEnv::new()
                .with_var("PROJECT_DIR", "/mnt/show")
                .with_var("USERPROFILE", "C:\\Users\\anim")
                .with_home("/home/anim"),
        )
    }

    #[rstest]
    #[case("${PROJECT_DIR}/chars/hero.blend", "/mnt/show/chars/hero.blend")]
    #[case("$PROJECT_DIR/chars/hero.blend", "/mnt/show/chars/hero.blend")]
    #[case("%USERPROFILE%\\chars\\hero.blend", "C:\\Users\\anim\\chars\\hero.blend")]
    #[case("~/chars/hero.blend", "/home/anim/chars/hero.blend")]
    #[case("~", "/home/anim")]
    #[case("/plain/path.blend", "/plain/path.blend")]
    fn test_expand_tokens(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(resolver().expand(input), expected);
    }

    #[rstest]
    #[case("${MISSING}/a.blend")]
    #[case("$MISSING/a.blend")]
    #[case("%MISSING%\\a.blend")]
    #[case("~other/a.blend")]
    fn test_unresolvable_tokens_left_verbatim(#[case] input: &str) {
        assert_eq!(resolver().expand(input), input);
    }

    #[test]
    fn test_expansion_disabled() {
        let resolver = resolver().with_expansion(false);
        assert_eq!(resolver.expand("${PROJECT_DIR}/a"), "${PROJECT_DIR}/a");
    }

    #[test]
    fn test_home_without_home_dir_is_verbatim() {
        let resolver = PathResolver::with_vars(MapEnv::new());
        assert_eq!(resolver.expand("~/a.blend"), "~/a.blend");
    }

    #[test]
    fn test_rewrite_replaces_all_occurrences() {
        assert_eq!(
            rewrite("S:\\chars\\hero_v01.blend", "S:\\", "P:\\"),
            Rewrite::Rewritten("P:\\chars\\hero_v01.blend".to_string())
        );
    }

    #[test]
    fn test_rewrite_skips_when_absent() {
        assert_eq!(rewrite("/mnt/chars/hero.blend", "S:\\", "P:\\"), Rewrite::Skipped);
        assert_eq!(rewrite("/mnt/chars/hero.blend", "", "P:\\"), Rewrite::Skipped);
    }

    #[rstest]
    #[case("S:\\chars\\hero_v01.blend", "hero_v01.blend")]
    #[case("/mnt/chars/hero_v01.blend", "hero_v01.blend")]
    #[case("hero.blend", "hero.blend")]
    fn test_file_name_splits_both_separators(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(file_name(input), expected);
    }

    #[test]
    fn test_replace_file_name_keeps_directory_text() {
        assert_eq!(
            replace_file_name("${PROJECT_DIR}/chars/hero_v01.blend", "hero_v03.blend"),
            "${PROJECT_DIR}/chars/hero_v03.blend"
        );
        assert_eq!(replace_file_name("hero_v01.blend", "hero_v02.blend"), "hero_v02.blend");
    }

    #[test]
    fn test_is_network_path() {
        assert!(is_network_path("//server/share/hero.blend"));
        assert!(is_network_path("\\\\server\\share\\hero.blend"));
        assert!(!is_network_path("/mnt/hero.blend"));
    }
}
