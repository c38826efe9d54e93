//! Host hooks for reloading sources and fetching upstream structure

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::model::LinkedRef;
use crate::project::{SourceDescriptor, UpstreamNode};
use crate::{Error, Result};

/// How the engines ask the host to touch linked data.
pub trait SourceLoader: Send + Sync {
    /// Re-read a source from its (already resolved) path.
    fn reload(&mut self, source: &SourceDescriptor, resolved: &Path) -> Result<()>;

    /// Current upstream structure of a linked object.
    fn fetch_upstream(&self, reference: &LinkedRef) -> Result<UpstreamNode>;
}

/// Loader for snapshot-driven sessions.
///
/// A reload succeeds when the resolved path is a readable file; upstream
/// structure comes from the snapshot's `upstream` table.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    upstream: BTreeMap<String, UpstreamNode>,
}

impl FsLoader {
    pub fn new(upstream: impl IntoIterator<Item = UpstreamNode>) -> Self {
        Self {
            upstream: upstream
                .into_iter()
                .map(|node| (node.name.clone(), node))
                .collect(),
        }
    }
}

impl SourceLoader for FsLoader {
    fn reload(&mut self, source: &SourceDescriptor, resolved: &Path) -> Result<()> {
        if !resolved.is_file() {
            return Err(Error::ReloadFailed {
                name: source.name.clone(),
                reason: format!("file not found: {}", resolved.display()),
            });
        }
        let stat = shadowlink_fs::stat(resolved).map_err(|e| Error::ReloadFailed {
            name: source.name.clone(),
            reason: e.to_string(),
        })?;
        debug!(source = %source.name, bytes = stat.size_bytes, "Reloaded source");
        Ok(())
    }

    fn fetch_upstream(&self, reference: &LinkedRef) -> Result<UpstreamNode> {
        self.upstream
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| Error::UpstreamUnavailable {
                reference: reference.name.clone(),
            })
    }
}
