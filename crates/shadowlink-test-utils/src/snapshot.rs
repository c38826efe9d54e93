//! [`SnapshotBuilder`] for writing project snapshot files.
//!
//! Builds the TOML text directly so the fixture does not depend on the
//! crates under test.

use std::fs;
use std::path::{Path, PathBuf};

/// Default snapshot file name.
pub const SNAPSHOT_FILE: &str = "shadowlink.toml";

/// Accumulates a TOML project snapshot.
///
/// # Example
///
/// ```rust,no_run
/// use shadowlink_test_utils::snapshot::SnapshotBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// SnapshotBuilder::new()
///     .setting("auto_fix_on_load", "true")
///     .source("hero", "//chars/hero_v01.blend")
///     .write(dir.path());
/// ```
#[derive(Debug, Default, Clone)]
pub struct SnapshotBuilder {
    settings: Vec<(String, String)>,
    sources: Vec<(String, String)>,
    raw: Vec<String>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `[settings]` entry; `value` is written verbatim as TOML.
    pub fn setting(mut self, key: &str, value: &str) -> Self {
        self.settings.push((key.to_string(), value.to_string()));
        self
    }

    pub fn source(mut self, name: &str, path: &str) -> Self {
        self.sources.push((name.to_string(), path.to_string()));
        self
    }

    /// Append TOML text as is (shadows, scripts, upstream tables).
    pub fn raw(mut self, toml: &str) -> Self {
        self.raw.push(toml.trim().to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        if !self.settings.is_empty() {
            out.push_str("[settings]\n");
            for (key, value) in &self.settings {
                out.push_str(&format!("{key} = {value}\n"));
            }
            out.push('\n');
        }
        for (name, path) in &self.sources {
            out.push_str(&format!(
                "[[sources]]\nname = {}\npath = {}\n\n",
                quote(name),
                quote(path)
            ));
        }
        for raw in &self.raw {
            out.push_str(raw);
            out.push_str("\n\n");
        }
        out
    }

    /// Write to `dir/shadowlink.toml` and return the file path.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join(SNAPSHOT_FILE);
        fs::write(&path, self.build()).unwrap();
        path
    }
}

/// TOML basic string literal.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_escapes_windows_paths() {
        let text = SnapshotBuilder::new()
            .source("hero", r"S:\chars\hero_v01.blend")
            .build();
        assert!(text.contains(r#"path = "S:\\chars\\hero_v01.blend""#));
    }

    #[test]
    fn test_settings_come_first() {
        let text = SnapshotBuilder::new()
            .source("a", "a.blend")
            .setting("validate_scripts", "false")
            .raw("[[scripts]]\nname = \"x\"\ntext = \"\"")
            .build();
        assert!(text.starts_with("[settings]\nvalidate_scripts = false\n"));
        assert!(text.trim_end().ends_with("text = \"\""));
    }
}
