//! Batch relink scenarios with host-style stored paths.
//!
//! Stored paths use Windows drive letters so the substitution logic is
//! exercised the same way on every platform. Reloading is delegated to a
//! loader that accepts every file, standing in for the host.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use shadowlink_core::{
    Error, ItemStatus, LinkedRef, Project, Result, Session, SourceDescriptor, SourceLoader,
    UpstreamNode,
};
use shadowlink_fs::{MapEnv, PathResolver};

/// Accepts every reload and remembers what it was asked to load.
#[derive(Clone, Default)]
struct HostLoader {
    loaded: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl SourceLoader for HostLoader {
    fn reload(&mut self, source: &SourceDescriptor, resolved: &Path) -> Result<()> {
        self.loaded
            .lock()
            .unwrap()
            .push((source.name.clone(), resolved.to_path_buf()));
        Ok(())
    }

    fn fetch_upstream(&self, reference: &LinkedRef) -> Result<UpstreamNode> {
        Err(Error::UpstreamUnavailable {
            reference: reference.name.clone(),
        })
    }
}

fn studio_project() -> Project {
    Project {
        sources: vec![
            SourceDescriptor::new("hero", r"S:\chars\hero_v01.blend"),
            SourceDescriptor::new("crate", r"S:\props\crate_v03.blend"),
            SourceDescriptor::new("backdrop", r"T:\sets\backdrop.blend"),
        ],
        ..Project::default()
    }
}

fn session(loader: HostLoader) -> Session {
    Session::new(studio_project())
        .with_paths(PathResolver::with_vars(MapEnv::new()))
        .with_loader(loader)
}

fn all_ids() -> Vec<String> {
    vec!["hero".into(), "crate".into(), "backdrop".into()]
}

#[test]
fn relink_drive_letter_rewrites_matching_sources_only() {
    let loader = HostLoader::default();
    let mut session = session(loader.clone());

    let summary = session.batch_relink(&all_ids(), r"S:\", r"P:\").unwrap();

    assert_eq!((summary.succeeded, summary.failed, summary.skipped), (2, 0, 1));
    assert_eq!(summary.outcome("backdrop").unwrap().status, ItemStatus::Skipped);
    let paths: Vec<_> = session
        .project()
        .sources
        .iter()
        .map(|s| s.path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            r"P:\chars\hero_v01.blend",
            r"P:\props\crate_v03.blend",
            r"T:\sets\backdrop.blend",
        ]
    );
    let loaded: Vec<_> = loader
        .loaded
        .lock()
        .unwrap()
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    assert_eq!(loaded, vec!["hero".to_string(), "crate".to_string()]);
}

#[test]
fn relink_only_touches_selected_sources() {
    let mut session = session(HostLoader::default());

    let summary = session
        .batch_relink(&["crate".to_string()], r"S:\", r"P:\")
        .unwrap();

    assert_eq!(summary.total(), 1);
    assert_eq!(session.project().sources[0].path, r"S:\chars\hero_v01.blend");
    assert_eq!(session.project().sources[1].path, r"P:\props\crate_v03.blend");
}

#[test]
fn relink_failure_keeps_new_path() {
    // The default loader needs the file on disk, which P:\ never is here
    let mut session = Session::new(studio_project()).with_paths(PathResolver::with_vars(MapEnv::new()));

    let summary = session
        .batch_relink(&["hero".to_string()], r"S:\", r"P:\")
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(session.project().sources[0].path, r"P:\chars\hero_v01.blend");
}

#[test]
fn relink_rejects_empty_search_and_empty_selection() {
    let mut session = session(HostLoader::default());

    assert!(session.batch_relink(&all_ids(), "", r"P:\").is_err());
    assert!(session.batch_relink(&[], r"S:\", r"P:\").is_err());
    assert_eq!(session.project().sources[0].path, r"S:\chars\hero_v01.blend");
}

#[test]
fn unknown_source_ids_are_reported_not_fatal() {
    let mut session = session(HostLoader::default());

    let summary = session
        .batch_relink(&["hero".to_string(), "ghost".to_string()], r"S:\", r"P:\")
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.outcome("ghost").unwrap().status, ItemStatus::Failed);
}

#[test]
fn registry_selection_feeds_batch_operations() {
    let mut session = session(HostLoader::default());

    assert_eq!(session.registry_mut().select(&["backdrop".to_string()]), 1);
    // Pattern selection adds to what is already selected
    assert_eq!(session.registry_mut().select_by_pattern("CRATE"), 1);
    let selected = session.registry().selected_names();
    assert_eq!(selected, vec!["crate".to_string(), "backdrop".to_string()]);

    let summary = session.batch_relink(&selected, r"S:\", r"P:\").unwrap();
    assert_eq!((summary.succeeded, summary.skipped), (1, 1));
    // Selection survives the refresh that follows a batch
    assert_eq!(session.registry().selected_names(), selected);
}
