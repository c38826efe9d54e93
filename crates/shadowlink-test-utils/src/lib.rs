//! Shared test fixtures for the shadowlink workspace.
//!
//! Fixtures only touch the filesystem, so every crate (including
//! shadowlink-core's own unit tests) can depend on this one.
//!
//! # Modules
//!
//! - [`tree`]: [`tree::AssetTree`] for directories of (versioned) asset files
//! - [`snapshot`]: [`snapshot::SnapshotBuilder`] for project snapshot files

pub mod snapshot;
pub mod tree;
