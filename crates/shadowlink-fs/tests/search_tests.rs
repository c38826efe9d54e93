//! Filesystem search and existence checks against real directories

use std::fs;

use pretty_assertions::assert_eq;
use shadowlink_fs::{MapEnv, PathResolver, find_by_name};
use tempfile::TempDir;

fn tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("chars/hero")).unwrap();
    fs::create_dir_all(temp.path().join("props")).unwrap();
    fs::write(temp.path().join("chars/hero/hero_v01.blend"), b"").unwrap();
    fs::write(temp.path().join("props/crate.blend"), b"").unwrap();
    temp
}

#[test]
fn test_non_recursive_search_only_checks_top_level() {
    let temp = tree();
    assert_eq!(find_by_name(temp.path(), "hero_v01.blend", false), None);
    assert_eq!(
        find_by_name(&temp.path().join("props"), "crate.blend", false),
        Some(temp.path().join("props/crate.blend"))
    );
}

#[test]
fn test_recursive_search_descends() {
    let temp = tree();
    let found = find_by_name(temp.path(), "hero_v01.blend", true).unwrap();
    assert!(found.ends_with("chars/hero/hero_v01.blend"));
}

#[test]
fn test_search_ignores_directories_with_matching_name() {
    let temp = tree();
    fs::create_dir_all(temp.path().join("decoy/crate.blend")).unwrap();
    let found = find_by_name(temp.path(), "crate.blend", true).unwrap();
    assert!(found.is_file());
}

#[test]
fn test_search_in_missing_directory_finds_nothing() {
    let temp = tree();
    assert_eq!(find_by_name(&temp.path().join("nope"), "crate.blend", true), None);
}

#[test]
fn test_exists_expands_variables_and_base_dir() {
    let temp = tree();
    let root = temp.path().to_string_lossy().into_owned();
    let resolver = PathResolver::with_vars(MapEnv::new().with_var("SHOW", root))
        .with_base_dir(temp.path());

    assert!(resolver.exists("${SHOW}/props/crate.blend"));
    assert!(resolver.exists("props/crate.blend"));
    assert!(!resolver.exists("${SHOW}/props/missing.blend"));
    assert!(!resolver.exists("${UNSET}/props/crate.blend"));
}

#[test]
fn test_resolve_relative_without_base_stays_relative() {
    let resolver = PathResolver::with_vars(MapEnv::new());
    assert!(resolver.resolve("not/here.blend").is_relative());
}
