//! End-to-end sync passes over a temporary vault and mirror

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tempfile::TempDir;
use vaultsync_core::config::SyncConfig;
use vaultsync_core::domain::{NoteMeta, Replica, ResultSetKind};
use vaultsync_core::ports::{
    ConfiguredMirrorLocator, INotificationService, IdentityTagResolver, ResultView,
    VaultNotification,
};
use vaultsync_sync::hasher::ContentHasher;
use vaultsync_sync::SyncOrchestrator;

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<VaultNotification>>,
    views: Mutex<Vec<ResultView>>,
}

#[async_trait]
impl INotificationService for RecordingNotifier {
    async fn notify(&self, n: &VaultNotification) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(n.clone());
        Ok(())
    }
    async fn show_result_view(&self, view: &ResultView) -> anyhow::Result<()> {
        self.views.lock().unwrap().push(view.clone());
        Ok(())
    }
    async fn is_showing_result_view(&self) -> bool {
        false
    }
}

struct Harness {
    local: TempDir,
    remote: TempDir,
    notifier: Arc<RecordingNotifier>,
    engine: SyncOrchestrator,
    settings: SyncConfig,
}

impl Harness {
    fn new(notebooks: &[&str]) -> Self {
        let local = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = SyncOrchestrator::new(
            Replica::local(local.path()),
            Arc::new(ConfiguredMirrorLocator::new(Some(remote.path().to_path_buf()))),
            notifier.clone(),
            Arc::new(IdentityTagResolver),
        )
        .with_export(false);
        let mut settings = SyncConfig::default();
        settings.enabled = true;
        for nb in notebooks {
            settings.enroll(*nb);
        }
        Self {
            local,
            remote,
            notifier,
            engine,
            settings,
        }
    }

    fn l(&self) -> &Path {
        self.local.path()
    }

    fn r(&self) -> &Path {
        self.remote.path()
    }
}

fn write(path: &Path, body: &str, mtime_ms: u64) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
    set_mtime(path, mtime_ms);
}

fn set_mtime(path: &Path, mtime_ms: u64) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_millis(mtime_ms))
        .unwrap();
}

fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn synced(path: &Path) -> i64 {
    NoteMeta::parse(&read(path)).unwrap().synced()
}

fn drop_event(remote: &Path, name: &str, body: &str) {
    let dir = remote.join(".events");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[tokio::test]
async fn one_sided_note_ends_identical_without_retention() {
    let mut h = Harness::new(&["A"]);
    write(&h.l().join("A/local.md"), "from vault", 1_000_000);
    write(&h.r().join("A/remote.md"), "from mirror", 2_000_000);

    let result = h.engine.run(&mut h.settings).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.pushed, 1);
    assert_eq!(result.pulled, 1);
    for name in ["A/local.md", "A/remote.md"] {
        assert_eq!(read(&h.l().join(name)), read(&h.r().join(name)));
        assert_eq!(mtime(&h.l().join(name)), mtime(&h.r().join(name)));
    }
    assert!(!h.l().join(".retained").exists());
    assert!(!h.r().join(".retained").exists());
    assert_eq!(result.updated.len(), 1);
    assert_eq!(result.updated[0].file_name(), "remote.md");
}

#[tokio::test]
async fn second_pass_without_changes_copies_nothing() {
    let mut h = Harness::new(&["A"]);
    write(&h.l().join("A/n.md"), "x", 1_000_000);
    write(&h.r().join("A/m.md"), "y", 1_500_000);

    let first = h.engine.run(&mut h.settings).await;
    assert_eq!(first.copied(), 2);

    let second = h.engine.run(&mut h.settings).await;
    assert_eq!(second.copied(), 0);
    assert_eq!(second.in_sync, 2);
    assert!(second.conflicts.is_empty());
    assert!(!h.l().join(".retained").exists());
}

#[tokio::test]
async fn newer_local_note_is_pushed_and_previous_remote_retained() {
    let mut h = Harness::new(&["A"]);
    write(&h.l().join("A/foo.md"), "local v2", 3_000_000);
    write(&h.r().join("A/foo.md"), "remote v1", 2_000_000);
    write(&h.l().join(".meta/A_foo.md"), r#"{"synced":"2000000","title":"Foo"}"#, 1);

    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.pushed, 1);
    assert!(result.conflicts.is_empty());
    assert_eq!(read(&h.r().join("A/foo.md")), "local v2");
    assert_eq!(mtime(&h.r().join("A/foo.md")), mtime(&h.l().join("A/foo.md")));
    assert_eq!(synced(&h.l().join(".meta/A_foo.md")), 3_000_000);
    assert_eq!(synced(&h.r().join(".meta/A_foo.md")), 3_000_000);
    assert_eq!(read(&h.r().join(".retained/foo.md")), "remote v1");
    assert!(read(&h.l().join(".meta/A_foo.md")).contains("\"title\": \"Foo\""));
}

#[tokio::test]
async fn diverged_note_is_reported_as_conflict_and_left_alone() {
    let mut h = Harness::new(&["A"]);
    write(&h.l().join("A/foo.md"), "local edit", 3_000_000);
    write(&h.r().join("A/foo.md"), "remote edit", 2_000_000);
    write(&h.l().join(".meta/A_foo.md"), r#"{"synced":"1000000"}"#, 1);

    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.pushed, 0);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(read(&h.r().join("A/foo.md")), "remote edit");
    assert_eq!(read(&h.l().join("A/foo.md")), "local edit");
    assert_eq!(synced(&h.l().join(".meta/A_foo.md")), 1_000_000);
    assert!(!h.r().join(".retained").exists());

    let views = h.notifier.views.lock().unwrap();
    match views.as_slice() {
        [ResultView::Show(set)] => {
            assert_eq!(set.kind(), ResultSetKind::Conflict);
            assert_eq!(set.title(), "Conflict (1)");
        }
        other => panic!("unexpected views: {other:?}"),
    }
}

#[tokio::test]
async fn newer_remote_note_edited_locally_is_not_pulled() {
    let mut h = Harness::new(&["A"]);
    write(&h.l().join("A/foo.md"), "local edit", 2_500_000);
    write(&h.r().join("A/foo.md"), "remote edit", 3_000_000);
    write(&h.l().join(".meta/A_foo.md"), r#"{"synced":"2000000"}"#, 1);

    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.pulled, 0);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].file_name(), "foo.md");
    assert!(result.updated.is_empty());
    assert_eq!(read(&h.l().join("A/foo.md")), "local edit");
    assert_eq!(read(&h.r().join("A/foo.md")), "remote edit");
    assert_eq!(synced(&h.l().join(".meta/A_foo.md")), 2_000_000);
    assert!(!h.l().join(".retained").exists());
    assert!(!h.r().join(".retained").exists());
}

#[tokio::test]
async fn unparsable_local_meta_skips_the_note_and_keeps_its_fields() {
    let mut h = Harness::new(&["A"]);
    let broken = r#"{"synced":"1000000","title":"Foo","tags":["x"],}"#;
    write(&h.l().join("A/foo.md"), "local edit", 3_000_000);
    write(&h.r().join("A/foo.md"), "remote edit", 2_000_000);
    write(&h.l().join(".meta/A_foo.md"), broken, 1);
    write(&h.l().join("A/other.md"), "fine", 1_000_000);

    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.pushed, 1);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert!(result.errors[0].contains("A_foo.md"));
    assert_eq!(read(&h.r().join("A/foo.md")), "remote edit");
    assert_eq!(read(&h.l().join(".meta/A_foo.md")), broken);
    assert_eq!(read(&h.r().join("A/other.md")), "fine");
    assert!(!h.r().join(".retained").exists());
}

#[tokio::test]
async fn retention_keeps_only_the_latest_prior_version() {
    let mut h = Harness::new(&["A"]);
    write(&h.l().join("A/foo.md"), "v2", 3_000_000);
    write(&h.r().join("A/foo.md"), "v1", 2_000_000);
    write(&h.l().join(".meta/A_foo.md"), r#"{"synced":"2000000"}"#, 1);
    h.engine.run(&mut h.settings).await;

    std::fs::write(h.l().join("A/foo.md"), "v3").unwrap();
    set_mtime(&h.l().join("A/foo.md"), 4_000_000);
    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.pushed, 1);
    assert_eq!(read(&h.r().join("A/foo.md")), "v3");
    assert_eq!(read(&h.r().join(".retained/foo.md")), "v2");
    let retained: Vec<_> = std::fs::read_dir(h.r().join(".retained"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.starts_with("foo"))
        .collect();
    assert_eq!(retained, vec!["foo.md".to_string()]);
}

#[tokio::test]
async fn move_event_moves_note_meta_and_attachments() {
    let mut h = Harness::new(&["A", "B"]);
    write(&h.l().join("A/x.md"), "note body", 1_000_000);
    write(&h.l().join(".meta/A_x.md"), r#"{"title":"X"}"#, 1);
    write(&h.l().join("A/x.md.attachments/pic.png"), "png", 1);
    std::fs::create_dir_all(h.l().join("B")).unwrap();

    let hash = ContentHasher::digest(b"note body");
    drop_event(
        h.r(),
        "0001.json",
        &format!(
            r#"{{"op":"move","sourceNote":"/A/x.md","destNote":"/B/x.md","sourceMeta":"/.meta/A_x.md","destMeta":"/.meta/B_x.md","contentHash":"{hash}"}}"#
        ),
    );

    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.moved, 1);
    assert!(!h.l().join("A/x.md").exists());
    assert_eq!(read(&h.l().join("B/x.md")), "note body");
    assert!(h.l().join(".meta/B_x.md").exists());
    assert!(!h.l().join(".meta/A_x.md").exists());
    assert!(h.l().join("B/x.md.attachments/pic.png").exists());
    assert!(!h.r().join(".events/0001.json").exists());

    let log = read(&h.l().join(".synclog"));
    let move_line = log.lines().find(|l| l.contains(",MOVE,")).unwrap();
    assert!(move_line.ends_with(&format!(
        "{},{}",
        h.l().join("A/x.md").display(),
        h.l().join("B/x.md").display()
    )));

    let events = h.notifier.events.lock().unwrap();
    for notebook in ["A", "B"] {
        assert!(events.contains(&VaultNotification::NotebookRefreshed {
            notebook: notebook.to_string()
        }));
    }
}

#[tokio::test]
async fn move_event_with_wrong_hash_changes_nothing() {
    let mut h = Harness::new(&["A", "B"]);
    write(&h.l().join("A/x.md"), "note body", 1_000_000);
    write(&h.l().join(".meta/A_x.md"), r#"{"title":"X"}"#, 1);

    let hash = ContentHasher::digest(b"something else");
    drop_event(
        h.r(),
        "0001.json",
        &format!(
            r#"{{"op":"move","sourceNote":"/A/x.md","destNote":"/B/x.md","contentHash":"{hash}"}}"#
        ),
    );

    let result = h.engine.run(&mut h.settings).await;

    assert_eq!(result.moved, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(read(&h.l().join("A/x.md")), "note body");
    assert!(h.l().join(".meta/A_x.md").exists());
    assert!(!h.l().join("B/x.md").exists());
    assert!(!h.r().join(".events/0001.json").exists());
}

#[tokio::test]
async fn newnotebook_event_enrolls_and_syncs_the_notebook() {
    let mut h = Harness::new(&["A"]);
    write(&h.r().join("Travel/packing.md"), "socks", 1_000_000);
    drop_event(h.r(), "a.json", r#"{"op":"newnotebook","name":"Travel"}"#);

    let result = h.engine.run(&mut h.settings).await;

    assert!(h.settings.is_enrolled("Travel"));
    assert!(h.l().join("Travel").is_dir());
    assert_eq!(result.pulled, 1);
    assert_eq!(read(&h.l().join("Travel/packing.md")), "socks");

    let events = h.notifier.events.lock().unwrap();
    assert!(events.contains(&VaultNotification::NotebookCreated {
        notebook: "Travel".to_string()
    }));
    assert!(events.contains(&VaultNotification::NotebookListChanged));
}

#[tokio::test]
async fn export_runs_last_and_covers_pulled_notes() {
    let local = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let engine = SyncOrchestrator::new(
        Replica::local(local.path()),
        Arc::new(ConfiguredMirrorLocator::new(Some(remote.path().to_path_buf()))),
        Arc::new(RecordingNotifier::default()),
        Arc::new(IdentityTagResolver),
    );
    let mut settings = SyncConfig::default();
    settings.enabled = true;
    settings.enroll("A");
    write(&remote.path().join("A/idea.md"), "zeppelin", 1_000_000);

    engine.run(&mut settings).await;

    let index =
        vaultsync_sync::exporter::decode_index(&remote.path().join(".searchIndex.gz")).unwrap();
    assert_eq!(index["notes"], serde_json::json!(["/A/idea.md"]));
    assert_eq!(index["words"]["zeppelin"], serde_json::json!([0]));
}
