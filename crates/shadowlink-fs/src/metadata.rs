//! File metadata queries

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Size and modification time of an asset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Read size and modification time.
pub fn stat(path: &Path) -> Result<FileStat> {
    let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    Ok(FileStat {
        size_bytes: meta.len(),
        last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
    })
}

/// Human-readable size: bytes, then KB and MB with one decimal.
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_human_size_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_stat_reports_size() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hero_v01.blend");
        fs::write(&path, b"0123456789").unwrap();

        let stat = stat(&path).unwrap();
        assert_eq!(stat.size_bytes, 10);
        assert!(stat.last_modified.is_some());
    }

    #[test]
    fn test_stat_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = stat(&temp.path().join("missing.blend")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
