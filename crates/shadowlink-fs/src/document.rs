//! Loading and saving serde documents by file extension
//!
//! Project snapshots and settings files may be written as TOML, JSON or
//! YAML; the extension decides which.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result, io};

/// Document formats understood by [`load`] and [`save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    /// Parse `content` in this format.
    pub fn parse<T: DeserializeOwned>(self, content: &str, path: &Path) -> Result<T> {
        let parsed = match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| Error::DocumentParse {
            path: path.to_path_buf(),
            format: self.name().into(),
            message,
        })
    }

    /// Render `value` in this format.
    pub fn render<T: Serialize>(self, value: &T, path: &Path) -> Result<String> {
        let rendered = match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        };
        rendered.map_err(|message| Error::DocumentSerialize {
            path: path.to_path_buf(),
            format: self.name().into(),
            message,
        })
    }
}

/// Read and parse a document.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = Format::from_path(path)?;
    let content = io::read_text(path)?;
    format.parse(&content, path)
}

/// Serialize and atomically write a document.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = Format::from_path(path)?;
    let content = format.render(value, path)?;
    io::write_atomic(path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[rstest]
    #[case("doc.toml")]
    #[case("doc.json")]
    #[case("doc.yaml")]
    fn test_save_then_load(#[case] file: &str) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(file);
        let doc = Doc {
            name: "hero".into(),
            count: 3,
        };

        save(&path, &doc).unwrap();
        let loaded: Doc = load(&path).unwrap();

        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = Format::from_path(Path::new("doc.ini")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { extension } if extension == "ini"));
    }

    #[test]
    fn test_parse_error_names_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load::<Doc>(&path).unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }
}
