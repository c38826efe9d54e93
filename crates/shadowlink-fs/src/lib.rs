//! Filesystem layer for shadowlink
//!
//! Provides environment-aware path resolution, version token detection for
//! asset files, file metadata queries and document load/save. Everything in
//! this crate treats asset files as opaque: only their names, existence, size
//! and modification time are ever inspected.

pub mod document;
pub mod env;
pub mod error;
pub mod io;
pub mod metadata;
pub mod path;
pub mod version;

pub use document::Format;
pub use env::{MapEnv, SystemEnv, VarSource};
pub use error::{Error, Result};
pub use metadata::{FileStat, human_size, stat};
pub use path::{PathResolver, Rewrite, file_name, find_by_name, is_network_path, replace_file_name, rewrite};
pub use version::{VersionInfo, VersionPattern, VersionResolver, VersionedFile};
