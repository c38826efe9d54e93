//! Whole-project scenarios: open a snapshot, fix links headlessly, move to
//! the newest versions, resync and repair, then save and reopen.

use pretty_assertions::assert_eq;
use shadowlink_core::{HealthStatus, IssueKind, Project, ResyncMode, Session};
use shadowlink_fs::{MapEnv, PathResolver};
use shadowlink_test_utils::snapshot::SnapshotBuilder;
use shadowlink_test_utils::tree::AssetTree;

const HERO: &str = r#"
[[shadows]]
name = "hero"
system_override = true

[shadows.reference]
name = "hero"
source = "hero"

[[shadows.children]]
name = "hero_rig"

[shadows.children.reference]
name = "hero_rig"
source = "hero"

[shadows.children.kind]
type = "rig"

[[shadows.children.kind.joints]]
name = "root"

[shadows.children.kind.joints.locks]
location = [true, true, true]
rotation = [true, true, true]
scale = [true, true, true]

[shadows.children.script]
script = "rig_ui_hero"
original = "rig_ui"

[[scripts]]
name = "rig_ui"
text = "print('panel')"

[[upstream]]
name = "hero"

[[upstream.children]]
name = "hero_rig"

[upstream.children.kind]
type = "rig"

[[upstream.children.kind.joints]]
name = "root"

[[upstream.children.kind.joints]]
name = "jaw"
"#;

fn studio(tree: &AssetTree) -> SnapshotBuilder {
    tree.versioned("lib/chars", "hero", "blend", &[1, 2]);
    SnapshotBuilder::new()
        .source("hero", "${ASSET_ROOT}/chars/hero_v01.blend")
        .raw(HERO)
}

/// Session with `ASSET_ROOT` pointing at the tree's `lib` folder.
fn open(tree: &AssetTree, builder: SnapshotBuilder) -> Session {
    let path = builder.write(tree.root());
    let project = Project::load(&path).unwrap();
    let vars = MapEnv::new().with_var("ASSET_ROOT", tree.path_text("lib"));
    Session::new(project).with_paths(PathResolver::with_vars(vars).with_base_dir(tree.root()))
}

#[test]
fn headless_open_fixes_variable_paths() {
    let tree = AssetTree::new();
    let mut session = open(&tree, studio(&tree));

    // Resolvable after expansion, so nothing is reported missing
    assert!(session.validate_all());
    let stats = session.fix_on_load().unwrap();
    assert_eq!((stats.total, stats.already_ok, stats.fixed), (1, 0, 1));
    assert_eq!(
        session.project().sources[0].path,
        format!("{}/chars/hero_v01.blend", tree.path_text("lib"))
    );
    assert!(session.registry().get("hero").unwrap().exists);

    let again = session.fix_on_load().unwrap();
    assert_eq!((again.already_ok, again.fixed), (1, 0));
}

#[test]
fn disabled_expansion_leaves_variable_paths_missing() {
    let tree = AssetTree::new();
    let mut session = open(&tree, studio(&tree).setting("use_environment_variables", "false"));

    assert!(!session.paths().expands_variables());
    assert!(!session.validate_all());
    let stats = session.auto_fix_broken_links(false);
    assert_eq!((stats.fixed, stats.missing), (0, 1));
    assert_eq!(
        session.project().sources[0].path,
        "${ASSET_ROOT}/chars/hero_v01.blend"
    );
}

#[test]
fn auto_fix_on_load_can_be_turned_off() {
    let tree = AssetTree::new();
    let mut session = open(&tree, studio(&tree).setting("auto_fix_on_load", "false"));
    assert!(session.fix_on_load().is_none());
}

#[test]
fn bump_keeps_variable_prefix() {
    let tree = AssetTree::new();
    let mut session = open(&tree, studio(&tree));

    let info = session.version_info("hero").unwrap();
    assert_eq!((info.current, info.latest), (Some(1), Some(2)));

    let summary = session.bump_to_latest(&["hero".to_string()]);

    assert_eq!(summary.succeeded, 1);
    assert_eq!(
        session.project().sources[0].path,
        "${ASSET_ROOT}/chars/hero_v02.blend"
    );
}

#[test]
fn resync_then_repair_brings_hierarchy_to_health() {
    let tree = AssetTree::new();
    let mut session = open(&tree, studio(&tree));

    let broken_script = session.run_health_check();
    assert_eq!(broken_script.len(), 2);

    let resync = session.resync("hero", ResyncMode::Hierarchy).unwrap();
    assert!(resync.succeeded());
    assert_eq!(resync.resynced, vec!["hero".to_string(), "hero_rig".to_string()]);
    assert_eq!(resync.joints_added, 1);

    // Local locks survived the resync
    let rig = session.project().shadow("hero_rig").unwrap().rig().unwrap();
    assert!(rig.joint("root").unwrap().locks.fully_locked());
    assert!(rig.joint("jaw").is_some());

    let report = session.repair("hero_rig").unwrap();
    assert!(report.fixes.iter().any(|f| f.contains("Unlocked 1 fully locked joints")));
    assert!(
        report
            .fixes
            .iter()
            .any(|f| f == "Restored script reference 'rig_ui_hero' to original 'rig_ui'")
    );
    session.repair("hero").unwrap();

    for report in session.run_health_check() {
        assert_eq!(report.status, HealthStatus::Healthy, "{}", report.description());
    }
}

#[test]
fn isolated_copies_survive_save_and_reopen() {
    let tree = AssetTree::new();
    let mut session = open(&tree, studio(&tree));

    let copy = session.isolate_script("hero_rig", "shot010").unwrap();
    assert_eq!(copy, "rig_ui_shot010");
    let binding = session
        .project()
        .shadow("hero_rig")
        .unwrap()
        .script
        .clone()
        .unwrap();
    assert_eq!(binding.original.as_deref(), Some("rig_ui"));

    let path = tree.path("out.yaml");
    session.save(&path).unwrap();
    let reopened = Project::load(&path).unwrap();

    assert_eq!(&reopened, session.project());
    assert!(reopened.scripts.contains("rig_ui_shot010"));
}

#[test]
fn missing_source_is_an_error_repair_cannot_fix() {
    let tree = AssetTree::new();
    let mut session = open(&tree, SnapshotBuilder::new().source("hero", "gone/hero.blend").raw(HERO));

    let broken = session.find_broken();
    assert_eq!(broken.len(), 2);
    assert!(
        broken
            .iter()
            .all(|(_, issues)| issues.iter().any(|i| i.kind == IssueKind::SourceNotFound))
    );

    let report = session.repair("hero").unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].contains("gone/hero.blend"));
}
