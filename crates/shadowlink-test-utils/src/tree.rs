//! [`AssetTree`] for building directories of asset files.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory of placeholder asset files.
///
/// # Example
///
/// ```rust
/// use shadowlink_test_utils::tree::AssetTree;
///
/// let tree = AssetTree::new();
/// tree.versioned("chars", "hero", "blend", &[1, 2, 10]);
/// tree.assert_exists("chars/hero_v10.blend");
/// ```
pub struct AssetTree {
    temp_dir: TempDir,
}

impl Default for AssetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetTree {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the tree.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// [`Self::path`] as text with `/` separators, the way a snapshot
    /// stores it.
    pub fn path_text(&self, rel: &str) -> String {
        self.path(rel).to_string_lossy().replace('\\', "/")
    }

    /// Create an empty file, with parent directories.
    pub fn touch(&self, rel: &str) -> PathBuf {
        self.touch_sized(rel, 0)
    }

    /// Create a file of `size` zero bytes.
    pub fn touch_sized(&self, rel: &str, size: usize) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Create `{dir}/{stem}_vNN.{ext}` for each version, zero padded to two
    /// digits. Returns the created paths in the given order.
    pub fn versioned(&self, dir: &str, stem: &str, ext: &str, versions: &[u32]) -> Vec<PathBuf> {
        versions
            .iter()
            .map(|v| self.touch(&format!("{dir}/{stem}_v{v:02}.{ext}")))
            .collect()
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_missing(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
