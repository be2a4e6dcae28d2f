/// End-to-end session tests.
///
/// Each test builds a real project tree under a `tempfile` directory and
/// drives a `Coordinator` through analysis, reference checks and deletion.
/// The dependency index and scene host are in-memory; the filesystem is not
/// mocked.
use std::collections::HashSet;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use unbloat_core::coordinator::{NO_REFERENCES_MESSAGE, NO_UNUSED_MESSAGE};
use unbloat_core::deletion::{LocalStorage, Storage};
use unbloat_core::index::MemoryAssetIndex;
use unbloat_core::model::CandidateStatus;
use unbloat_core::progress::CancelToken;
use unbloat_core::prompt::RecordingPrompt;
use unbloat_core::scenes::{
    Component, FieldValue, MemorySceneHost, SceneDescriptor, SceneObject, StaticSceneCatalog,
};
use unbloat_core::{AnalysisConfig, AssetPath, Coordinator, Error, Ports, Warning};

// ── Helpers ──────────────────────────────────────────────────────────────────

const MAIN_SCENE: &str = "Assets/Scenes/Main.unity";
const TEX_GUID: &str = "9f1c0e3a5b7d4e21a0c3f5e7d9b1a2c4";

fn write_bytes(root: &Path, rel: &str, n: usize) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn p(s: &str) -> AssetPath {
    AssetPath::new(s)
}

/// Storage that refuses to remove the listed directories.
#[derive(Debug)]
struct FlakyStorage {
    inner: LocalStorage,
    fail: HashSet<AssetPath>,
}

impl Storage for FlakyStorage {
    fn remove_dir_all(&mut self, dir: &AssetPath) -> io::Result<()> {
        if self.fail.contains(dir) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked by another process"));
        }
        self.inner.remove_dir_all(dir)
    }

    fn remove_file(&mut self, file: &AssetPath) -> io::Result<()> {
        self.inner.remove_file(file)
    }
}

struct Fixture {
    tmp: TempDir,
    config: AnalysisConfig,
    index: MemoryAssetIndex,
    host: MemorySceneHost,
    catalog: StaticSceneCatalog,
    prompt: RecordingPrompt,
    storage: FlakyStorage,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Assets")).unwrap();
        let storage = FlakyStorage {
            inner: LocalStorage::new(tmp.path()),
            fail: HashSet::new(),
        };
        Self {
            tmp,
            config: AnalysisConfig::default(),
            index: MemoryAssetIndex::new(),
            host: MemorySceneHost::new(),
            catalog: StaticSceneCatalog(vec![SceneDescriptor::new(MAIN_SCENE, true)]),
            prompt: RecordingPrompt::answering(true),
            storage,
        }
    }

    /// ```text
    /// Assets/
    ///   Unused.meta          (10)
    ///   Unused/
    ///     Foo.meta           (10)
    ///     Foo/
    ///       tex.png          (100)
    ///       tex.png.meta     (20)
    ///   Used/
    ///     a.png              (50)   referenced by Main.unity
    /// ```
    fn with_default_tree(mut self) -> Self {
        let root = self.tmp.path();
        write_bytes(root, "Assets/Unused.meta", 10);
        write_bytes(root, "Assets/Unused/Foo.meta", 10);
        write_bytes(root, "Assets/Unused/Foo/tex.png", 100);
        write_bytes(root, "Assets/Unused/Foo/tex.png.meta", 20);
        write_bytes(root, "Assets/Used/a.png", 50);
        self.index.add_reference(MAIN_SCENE, "Assets/Used/a.png");
        self.index.register_guid(TEX_GUID, "Assets/Unused/Foo/tex.png");
        self
    }

    fn root(&self) -> &Path {
        self.tmp.path()
    }

    fn coordinator(&mut self) -> Coordinator<'_> {
        Coordinator::new(
            self.tmp.path(),
            self.config.clone(),
            Ports {
                index: &mut self.index,
                scenes: &mut self.host,
                catalog: &self.catalog,
                prompt: &mut self.prompt,
                storage: &mut self.storage,
            },
        )
        .unwrap()
    }
}

fn candidate_paths(coordinator: &Coordinator<'_>) -> Vec<String> {
    coordinator
        .candidates()
        .iter()
        .map(|c| c.path.to_string())
        .collect()
}

fn assert_total_matches(coordinator: &Coordinator<'_>) {
    let sum: u64 = coordinator.candidates().iter().map(|c| c.size_bytes).sum();
    assert_eq!(coordinator.total_size(), sum);
}

// ── Analysis ─────────────────────────────────────────────────────────────────

#[test]
fn empty_project_reports_nothing_found() {
    let mut fx = Fixture::new();
    let report = {
        let mut c = fx.coordinator();
        let report = c.analyze().unwrap();
        assert!(c.candidates().is_empty());
        assert_eq!(c.total_size(), 0);
        report
    };
    assert_eq!(report.summary, NO_UNUSED_MESSAGE);
    assert_eq!(fx.prompt.last_notice(), Some(NO_UNUSED_MESSAGE));
}

#[test]
fn missing_asset_root_is_an_error() {
    let mut fx = Fixture::new();
    fs::remove_dir(fx.root().join("Assets")).unwrap();
    let mut c = fx.coordinator();
    assert!(matches!(c.analyze(), Err(Error::RootNotFound(_))));
}

#[test]
fn unreferenced_directories_become_candidates_with_sizes() {
    let mut fx = Fixture::new().with_default_tree();
    let mut c = fx.coordinator();
    let report = c.analyze().unwrap();

    assert_eq!(candidate_paths(&c), vec!["Assets/Unused", "Assets/Unused/Foo"]);
    assert_eq!(c.candidates()[0].size_bytes, 130);
    assert_eq!(c.candidates()[1].size_bytes, 120);
    assert_eq!(c.total_size(), 250);
    assert_eq!(report.directories_scanned, 3);
    assert_eq!(report.summary, "Found 2 unused directories, totaling 250 Bytes.");
    assert_total_matches(&c);
}

#[test]
fn one_dependent_anywhere_flips_a_directory() {
    let mut fx = Fixture::new().with_default_tree();
    fx.index.add_reference("Assets/Prefabs/Hud.prefab", "Assets/Unused/Foo/tex.png");
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    assert!(c.candidates().is_empty());
}

#[test]
fn analysis_is_idempotent() {
    let mut fx = Fixture::new().with_default_tree();
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    let first = c.candidates().to_vec();
    let first_total = c.total_size();
    c.analyze().unwrap();
    assert_eq!(c.candidates(), first.as_slice());
    assert_eq!(c.total_size(), first_total);
}

#[test]
fn collapse_nested_reports_outermost_only() {
    let mut fx = Fixture::new().with_default_tree();
    fx.config.collapse_nested = true;
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    assert_eq!(candidate_paths(&c), vec!["Assets/Unused"]);
    assert_eq!(c.total_size(), 130);
}

#[test]
fn ignored_directories_are_never_reported() {
    let mut fx = Fixture::new().with_default_tree();
    fx.config.ignored_directories = vec!["Assets/Unused".to_string()];
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    assert!(c.candidates().is_empty());
}

#[test]
fn cancelled_analysis_stops_between_directories() {
    let mut fx = Fixture::new().with_default_tree();
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut c = fx.coordinator().with_cancel(cancel);
    let report = c.analyze().unwrap();
    assert!(report.cancelled);
    assert!(c.candidates().is_empty());
}

// ── Skip and reference checks ────────────────────────────────────────────────

#[test]
fn skip_removes_candidate_and_size() {
    let mut fx = Fixture::new().with_default_tree();
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    let skipped = c.skip(&p("Assets/Unused/Foo")).unwrap();
    assert_eq!(skipped.status, CandidateStatus::Skipped);
    assert_eq!(candidate_paths(&c), vec!["Assets/Unused"]);
    assert_eq!(c.total_size(), 130);
    assert_eq!(c.resolved().len(), 1);
    assert_total_matches(&c);

    assert!(matches!(
        c.skip(&p("Assets/Unused/Foo")),
        Err(Error::UnknownCandidate(_))
    ));
}

#[test]
fn directory_without_scene_references_stays() {
    let mut fx = Fixture::new().with_default_tree();
    fx.host.add_scene(
        MAIN_SCENE,
        vec![SceneObject::new("Main Camera").with_component(
            Component::new("Camera").with_field("targetTexture", FieldValue::Reference(None)),
        )],
    );
    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        let check = c.check_references(&p("Assets/Unused/Foo")).unwrap();
        assert!(check.matches.is_empty());
        assert_eq!(check.scenes_scanned, 1);
        assert_eq!(c.candidates().len(), 2);
        assert_eq!(c.total_size(), 250);
    }
    assert_eq!(fx.prompt.last_notice(), Some(NO_REFERENCES_MESSAGE));
    assert_eq!(fx.host.close_count(), 1);
    assert!(!fx.host.is_any_open());
}

#[test]
fn scene_reference_confirms_use() {
    let mut fx = Fixture::new().with_default_tree();
    fx.host.add_scene(
        MAIN_SCENE,
        vec![SceneObject::new("Canvas").with_child(SceneObject::new("Icon").with_component(
            Component::new("Image").with_field("m_Sprite", FieldValue::reference(TEX_GUID, 21300000)),
        ))],
    );
    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        let check = c.check_references(&p("Assets/Unused/Foo")).unwrap();
        assert_eq!(check.matches.len(), 1);
        let found = &check.matches[0];
        assert_eq!(found.object, "Canvas/Icon");
        assert_eq!(found.component, "Image");
        assert_eq!(found.field, "m_Sprite");

        assert_eq!(candidate_paths(&c), vec!["Assets/Unused"]);
        assert_eq!(c.total_size(), 130);
        assert_eq!(c.resolved()[0].status, CandidateStatus::ConfirmedUsed);
        assert_total_matches(&c);
    }
    let notice = fx.prompt.last_notice().unwrap();
    assert!(notice.starts_with("Found references in the following scenes:"));
    assert!(notice.contains(
        "Scene: Assets/Scenes/Main.unity, GameObject: Canvas/Icon, Component: Image, Property: m_Sprite"
    ));
}

#[test]
fn unopenable_scene_is_skipped_and_reported() {
    let mut fx = Fixture::new().with_default_tree();
    fx.catalog = StaticSceneCatalog(vec![
        SceneDescriptor::new("Assets/Scenes/Broken.unity", true),
        SceneDescriptor::new(MAIN_SCENE, true),
        SceneDescriptor::new("Assets/Scenes/Disabled.unity", false),
    ]);
    fx.host.add_scene(MAIN_SCENE, Vec::new());
    fx.host.break_scene("Assets/Scenes/Broken.unity");

    let mut c = fx.coordinator();
    c.analyze().unwrap();
    let check = c.check_references(&p("Assets/Unused/Foo")).unwrap();
    assert_eq!(check.scenes_scanned, 1);
    assert_eq!(check.warnings.len(), 1);
    assert!(check.is_partial());
    assert_eq!(c.candidates().len(), 2);
}

#[test]
fn check_all_opens_each_scene_once() {
    let mut fx = Fixture::new().with_default_tree();
    fx.catalog = StaticSceneCatalog(vec![
        SceneDescriptor::new(MAIN_SCENE, true),
        SceneDescriptor::new("Assets/Scenes/Menu.unity", true),
    ]);
    fx.host.add_scene(
        MAIN_SCENE,
        vec![SceneObject::new("Player").with_component(
            Component::new("Skin").with_field(
                "variants",
                FieldValue::List(vec![
                    FieldValue::Scalar("plain".to_string()),
                    FieldValue::reference(TEX_GUID, 2800000),
                ]),
            ),
        )],
    );
    fx.host.add_scene("Assets/Scenes/Menu.unity", Vec::new());

    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        let checks = c.check_all_references().unwrap();
        assert_eq!(checks.len(), 2);
        // Both the directory and its parent contain tex.png.
        assert!(checks.iter().all(|check| check.matches.len() == 1));
        assert_eq!(checks[1].matches[0].field, "variants[1]");
        assert!(c.candidates().is_empty());
        assert_eq!(c.total_size(), 0);
        assert_eq!(c.resolved().len(), 2);
    }
    assert_eq!(fx.host.opened().len(), 2);
    assert_eq!(fx.host.close_count(), 2);
}

#[test]
fn check_all_survives_a_vanished_candidate() {
    const LOOSE_GUID: &str = "0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e";
    let mut fx = Fixture::new().with_default_tree();
    write_bytes(fx.root(), "Assets/Loose/b.png", 5);
    fx.index.register_guid(LOOSE_GUID, "Assets/Loose/b.png");
    fx.host.add_scene(
        MAIN_SCENE,
        vec![SceneObject::new("Hud")
            .with_component(Component::new("Badge").with_field("sprite", FieldValue::reference(LOOSE_GUID, 21300000)))],
    );

    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        assert_eq!(
            candidate_paths(&c),
            vec!["Assets/Loose", "Assets/Unused", "Assets/Unused/Foo"]
        );
        // Removed behind the tool's back.
        fs::remove_dir_all(c.project_root().join("Assets/Unused/Foo")).unwrap();

        let checks = c.check_all_references().unwrap();
        let dirs: Vec<_> = checks.iter().map(|check| check.directory.as_str()).collect();
        assert_eq!(dirs, vec!["Assets/Loose", "Assets/Unused", "Assets/Unused/Foo"]);
        assert_eq!(checks[0].matches.len(), 1);

        let vanished = &checks[2];
        assert!(vanished.matches.is_empty());
        assert_eq!(vanished.scenes_scanned, 0);
        assert!(vanished.is_partial());
        assert!(matches!(
            &vanished.warnings[..],
            [Warning::UnreadableEntry { path, .. }] if path == "Assets/Unused/Foo"
        ));

        assert_eq!(candidate_paths(&c), vec!["Assets/Unused", "Assets/Unused/Foo"]);
        assert_total_matches(&c);
    }
    assert_eq!(fx.host.close_count(), 1);
}

#[test]
fn analysis_reports_incomplete_index() {
    let mut fx = Fixture::new().with_default_tree();
    fx.index
        .mark_incomplete("Assets/Used/a.png.meta", "permission denied");
    let mut c = fx.coordinator();
    let report = c.analyze().unwrap();
    assert!(report.warnings.contains(&Warning::IndexIncomplete {
        path: "Assets/Used/a.png.meta".to_string(),
        message: "permission denied".to_string(),
    }));
}

#[test]
fn cancelled_check_changes_nothing() {
    let mut fx = Fixture::new().with_default_tree();
    fx.host.add_scene(
        MAIN_SCENE,
        vec![SceneObject::new("Icon").with_component(
            Component::new("Image").with_field("m_Sprite", FieldValue::reference(TEX_GUID, 1)),
        )],
    );
    let cancel = CancelToken::new();
    let mut c = fx.coordinator().with_cancel(cancel.clone());
    c.analyze().unwrap();
    cancel.cancel();
    let check = c.check_references(&p("Assets/Unused/Foo")).unwrap();
    assert!(check.cancelled);
    assert_eq!(c.candidates().len(), 2);
}

// ── Deletion ─────────────────────────────────────────────────────────────────

#[test]
fn declined_delete_touches_nothing() {
    let mut fx = Fixture::new().with_default_tree();
    fx.prompt = RecordingPrompt::answering(false);
    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        let report = c.delete(&p("Assets/Unused/Foo")).unwrap();
        assert!(report.declined);
        assert_eq!(c.candidates().len(), 2);
    }
    assert!(fx.root().join("Assets/Unused/Foo").exists());
    assert_eq!(fx.prompt.confirmations[0].0, "Delete Directory");
    assert_eq!(fx.index.refresh_count(), 0);
}

#[test]
fn delete_removes_directory_sidecar_and_candidate() {
    let mut fx = Fixture::new().with_default_tree();
    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        let report = c.delete(&p("Assets/Unused/Foo")).unwrap();
        assert_eq!(report.deleted.len(), 1);
        assert_eq!(report.bytes_freed(), 120);
        assert!(report.warnings.is_empty());
        assert_eq!(candidate_paths(&c), vec!["Assets/Unused"]);
        assert_eq!(c.total_size(), 130);
        assert_total_matches(&c);
    }
    assert!(!fx.root().join("Assets/Unused/Foo").exists());
    assert!(!fx.root().join("Assets/Unused/Foo.meta").exists());
    assert_eq!(fx.index.refresh_count(), 1);
}

#[test]
fn deleting_a_parent_takes_nested_candidates_along() {
    let mut fx = Fixture::new().with_default_tree();
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    let report = c.delete(&p("Assets/Unused")).unwrap();
    assert_eq!(report.deleted[0].nested, vec![p("Assets/Unused/Foo")]);
    assert!(c.candidates().is_empty());
    assert_eq!(c.total_size(), 0);
}

#[test]
fn delete_all_keeps_failures_in_the_set() {
    let mut fx = Fixture::new();
    write_bytes(fx.root(), "Assets/A/one.bin", 100);
    write_bytes(fx.root(), "Assets/B/two.bin", 200);
    write_bytes(fx.root(), "Assets/C/three.bin", 300);
    fx.storage.fail.insert(p("Assets/B"));

    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        assert_eq!(c.total_size(), 600);

        let report = c.delete_all().unwrap();
        let deleted: Vec<_> = report.deleted.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(deleted, vec!["Assets/A", "Assets/C"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, p("Assets/B"));
        assert!(report.failed[0].reason.contains("locked"));
        assert!(!report.is_complete());

        assert_eq!(candidate_paths(&c), vec!["Assets/B"]);
        assert_eq!(c.total_size(), 200);
        assert_total_matches(&c);
    }
    assert!(fx.root().join("Assets/B/two.bin").exists());
    assert!(!fx.root().join("Assets/A").exists());
    assert_eq!(fx.prompt.confirmations.len(), 1);
    assert_eq!(fx.index.refresh_count(), 1, "refreshed once for the batch");
}

#[test]
fn delete_all_writes_audit_rows() {
    let mut fx = Fixture::new();
    write_bytes(fx.root(), "Assets/A/one.bin", 100);
    write_bytes(fx.root(), "Assets/B/two.bin", 200);
    fx.storage.fail.insert(p("Assets/B"));
    fx.config.audit_log = Some("audit.csv".into());

    {
        let mut c = fx.coordinator();
        c.analyze().unwrap();
        c.delete_all().unwrap();
    }
    let text = fs::read_to_string(fx.root().join("audit.csv")).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "timestamp,action,path,size_bytes,outcome,detail");
    assert!(lines[1].contains(",delete_all,Assets/A,100,deleted,"));
    assert!(lines[2].contains(",delete_all,Assets/B,200,failed,"));
}

#[test]
fn unknown_candidate_operations_fail() {
    let mut fx = Fixture::new().with_default_tree();
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    assert!(matches!(c.delete(&p("Assets/Used")), Err(Error::UnknownCandidate(_))));
    assert!(matches!(
        c.check_references(&p("Assets/Used")),
        Err(Error::UnknownCandidate(_))
    ));
}

// ── Clear and locate ─────────────────────────────────────────────────────────

#[test]
fn clear_forgets_results() {
    let mut fx = Fixture::new().with_default_tree();
    let mut c = fx.coordinator();
    c.analyze().unwrap();
    c.skip(&p("Assets/Unused")).unwrap();
    c.clear();
    assert!(c.candidates().is_empty());
    assert!(c.resolved().is_empty());
    assert_eq!(c.total_size(), 0);
}

#[test]
fn locate_resolves_existing_directories_only() {
    let mut fx = Fixture::new().with_default_tree();
    let root = fx.root().to_path_buf();
    let c = fx.coordinator();
    assert_eq!(
        c.locate(&p("Assets/Unused/Foo")),
        Some(root.join("Assets").join("Unused").join("Foo"))
    );
    assert_eq!(c.locate(&p("Assets/Gone")), None);
}
