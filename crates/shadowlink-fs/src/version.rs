//! Version token detection for asset files
//!
//! Asset files are iterated by bumping a numeric token in the file name
//! (`hero_v01.blend`, `hero.v02.blend`, `hero-v03.blend`). The resolver
//! recognizes those tokens with an ordered pattern list, locates sibling
//! versions on disk and rebuilds file names for arbitrary version numbers.
//!
//! A file name may match more than one pattern; the pattern that comes first
//! in priority order always wins.

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static UNDERSCORE_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)_v(\d+)").unwrap());
static UNDERSCORE_VER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)_ver(\d+)").unwrap());
static UNDERSCORE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_version(\d+)").unwrap());
static DOT_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.v(\d+)").unwrap());
static DASH_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)-v(\d+)").unwrap());

/// A version-naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPattern {
    /// `hero_v01.blend`
    UnderscoreV,
    /// `hero_ver01.blend`
    UnderscoreVer,
    /// `hero_version01.blend`
    UnderscoreVersion,
    /// `hero.v01.blend`
    DotV,
    /// `hero-v01.blend`
    DashV,
}

impl VersionPattern {
    /// Default priority order.
    pub const PRIORITY: [VersionPattern; 5] = [
        Self::UnderscoreV,
        Self::UnderscoreVer,
        Self::UnderscoreVersion,
        Self::DotV,
        Self::DashV,
    ];

    /// Canonical separator text for this pattern.
    pub fn tag(self) -> &'static str {
        match self {
            Self::UnderscoreV => "_v",
            Self::UnderscoreVer => "_ver",
            Self::UnderscoreVersion => "_version",
            Self::DotV => ".v",
            Self::DashV => "-v",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Self::UnderscoreV => &UNDERSCORE_V,
            Self::UnderscoreVer => &UNDERSCORE_VER,
            Self::UnderscoreVersion => &UNDERSCORE_VERSION,
            Self::DotV => &DOT_V,
            Self::DashV => &DASH_V,
        }
    }
}

impl std::fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A file path paired with its detected version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedFile {
    pub path: String,
    pub version: Option<u32>,
}

impl VersionedFile {
    fn new(path: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }
}

/// Everything known about the versions of one path. Derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub current: Option<u32>,
    pub latest: Option<u32>,
    pub latest_path: String,
    pub has_newer: bool,
    pub all_versions: Vec<VersionedFile>,
    pub pattern: Option<VersionPattern>,
}

/// The winning pattern, the separator text as written, and the number.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenMatch {
    pattern: VersionPattern,
    tag: String,
    version: u32,
}

/// Detects, compares and rebuilds versioned file names.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    patterns: Vec<VersionPattern>,
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionResolver {
    pub fn new() -> Self {
        Self {
            patterns: VersionPattern::PRIORITY.to_vec(),
        }
    }

    /// Use a custom priority order.
    pub fn with_patterns(patterns: Vec<VersionPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[VersionPattern] {
        &self.patterns
    }

    fn match_token(&self, file_name: &str) -> Option<TokenMatch> {
        self.patterns.iter().find_map(|&pattern| {
            let caps = pattern.regex().captures(file_name)?;
            let whole = &caps[0];
            let digits = &caps[1];
            let version = digits.parse::<u32>().ok()?;
            Some(TokenMatch {
                pattern,
                tag: whole[..whole.len() - digits.len()].to_string(),
                version,
            })
        })
    }

    /// Version number in the file name of `path`, if any.
    pub fn extract_version(&self, path: &str) -> Option<u32> {
        self.match_token(crate::path::file_name(path))
            .map(|m| m.version)
    }

    /// Which pattern the file name of `path` matched.
    pub fn base_pattern(&self, path: &str) -> Option<VersionPattern> {
        self.match_token(crate::path::file_name(path))
            .map(|m| m.pattern)
    }

    /// File stem with every version token removed.
    ///
    /// Removing one token can join its neighbours into another
    /// (`a_-v1v2` -> `a_v2`), so patterns are reapplied until none match.
    pub fn base_name(&self, path: &str) -> String {
        let (stem, _) = split_extension(crate::path::file_name(path));
        let mut base = stem.to_string();
        loop {
            let scrubbed = self.patterns.iter().fold(base.clone(), |acc, pattern| {
                pattern.regex().replace_all(&acc, "").into_owned()
            });
            if scrubbed == base {
                return base;
            }
            base = scrubbed;
        }
    }

    /// All versions of `path` in its directory, ascending by version.
    ///
    /// A path without a version token yields only itself, unversioned.
    /// A path whose directory does not exist yields nothing.
    pub fn find_all_versions(&self, path: &str) -> Vec<VersionedFile> {
        let (dir_text, name) = split_directory(path);
        let dir = if dir_text.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(dir_text)
        };

        if !dir.is_dir() {
            debug!(path, "version scan skipped: directory does not exist");
            return Vec::new();
        }

        let Some(token) = self.match_token(name) else {
            return vec![VersionedFile::new(path, None)];
        };

        let (_, ext) = split_extension(name);
        let sibling = format!(
            "^{}(?i:{}).*{}$",
            regex::escape(&self.base_name(path)),
            regex::escape(&token.tag),
            regex::escape(ext)
        );
        let sibling = match Regex::new(&sibling) {
            Ok(re) => re,
            Err(e) => {
                warn!(path, error = %e, "could not build sibling pattern");
                return Vec::new();
            }
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "version scan failed");
                return Vec::new();
            }
        };

        let mut versions: Vec<VersionedFile> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let file_name = entry.file_name().to_str()?.to_string();
                if !sibling.is_match(&file_name) {
                    return None;
                }
                let version = self.match_token(&file_name)?.version;
                Some(VersionedFile::new(format!("{dir_text}{file_name}"), Some(version)))
            })
            .collect();

        versions.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.path.cmp(&b.path)));
        debug!(path, found = versions.len(), "version scan complete");
        versions
    }

    /// Highest version on disk, or `path` itself when nothing was found.
    pub fn latest(&self, path: &str) -> VersionedFile {
        self.find_all_versions(path)
            .pop()
            .unwrap_or_else(|| VersionedFile::new(path, None))
    }

    /// Whether a higher version than the one in `path` exists.
    ///
    /// A path without a version token never has a newer version, even when
    /// numbered siblings exist.
    pub fn has_newer(&self, path: &str) -> bool {
        let Some(current) = self.extract_version(path) else {
            return false;
        };
        self.latest(path).version.is_some_and(|latest| latest > current)
    }

    /// Path to `version` of the asset at `base_path`, in the same directory.
    ///
    /// Uses the separator found in `base_path`, or `_v` when it has none.
    /// The number is zero-padded to at least two digits.
    pub fn build_path(&self, base_path: &str, version: u32) -> String {
        let (dir_text, name) = split_directory(base_path);
        let (_, ext) = split_extension(name);
        let tag = self
            .match_token(name)
            .map(|m| m.tag)
            .unwrap_or_else(|| VersionPattern::UnderscoreV.tag().to_string());
        format!("{dir_text}{}{tag}{version:02}{ext}", self.base_name(base_path))
    }

    /// Order two paths by version; `None` if either has no version.
    pub fn compare(&self, a: &str, b: &str) -> Option<Ordering> {
        Some(self.extract_version(a)?.cmp(&self.extract_version(b)?))
    }

    /// Bundle of current, latest and sibling information for `path`.
    pub fn info(&self, path: &str) -> VersionInfo {
        let current = self.extract_version(path);
        let all_versions = self.find_all_versions(path);
        let latest = all_versions
            .last()
            .cloned()
            .unwrap_or_else(|| VersionedFile::new(path, None));
        let has_newer = matches!((current, latest.version), (Some(c), Some(l)) if l > c);

        VersionInfo {
            current,
            latest: latest.version,
            latest_path: latest.path,
            has_newer,
            all_versions,
            pattern: self.base_pattern(path),
        }
    }
}

/// Split into (directory text including its trailing separator, file name).
fn split_directory(path: &str) -> (&str, &str) {
    let name = crate::path::file_name(path);
    (&path[..path.len() - name.len()], name)
}

/// Split a file name into (stem, extension including the dot).
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
        _ => (file_name, ""),
    }
}
