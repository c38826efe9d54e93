//! Error types for shadowlink-core
//!
//! Engines never fail a whole run because of one bad shadow or source; they
//! record per-item outcomes instead. The variants here cover contract
//! violations: unknown identities, invalid property paths, malformed
//! hierarchies and unreadable snapshots.

use std::path::PathBuf;

/// Result type for shadowlink-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shadowlink-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No override shadow with this name exists
    #[error("Override not found: {name}")]
    ShadowNotFound { name: String },

    /// No asset source with this name exists
    #[error("Asset source not found: {name}")]
    SourceNotFound { name: String },

    /// No script with this name exists
    #[error("Script not found: {name}")]
    ScriptNotFound { name: String },

    /// A property path outside the shadow's schema
    #[error("Unknown property '{path}' on {shadow}")]
    UnknownProperty { shadow: String, path: String },

    /// An identity field such as `name`, which no override may change
    #[error("'{path}' identifies {shadow} and cannot be made editable")]
    IdentityProperty { shadow: String, path: String },

    /// A child would make the hierarchy revisit one of its ancestors
    #[error("Hierarchy cycle: '{name}' already appears above '{parent}'")]
    HierarchyCycle { name: String, parent: String },

    /// Two top-level shadows share a name
    #[error("Duplicate override name: {name}")]
    DuplicateShadow { name: String },

    /// Two asset sources share a name
    #[error("Duplicate asset source name: {name}")]
    DuplicateSource { name: String },

    /// The source file could not be loaded by the host
    #[error("Reload failed for {name}: {reason}")]
    ReloadFailed { name: String, reason: String },

    /// The host has no upstream data for a reference
    #[error("No upstream data for '{reference}'")]
    UpstreamUnavailable { reference: String },

    /// Invalid argument passed to a command
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Snapshot file problems that are not plain I/O
    #[error("Invalid project snapshot at {path}: {message}")]
    InvalidSnapshot { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from shadowlink-fs
    #[error(transparent)]
    Fs(#[from] shadowlink_fs::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn shadow_not_found(name: impl Into<String>) -> Self {
        Self::ShadowNotFound { name: name.into() }
    }

    pub fn source_not_found(name: impl Into<String>) -> Self {
        Self::SourceNotFound { name: name.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
