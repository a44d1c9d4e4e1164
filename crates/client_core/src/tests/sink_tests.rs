use super::*;
use std::sync::Mutex;

enum DialogBehavior {
    Choose(PathBuf),
    Dismiss,
    Fail,
}

struct FakeDialog {
    behavior: DialogBehavior,
    suggested: Mutex<Vec<String>>,
}

impl FakeDialog {
    fn new(behavior: DialogBehavior) -> Self {
        Self {
            behavior,
            suggested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SaveDialog for FakeDialog {
    async fn choose_destination(&self, suggested_name: &str) -> ClientResult<Option<PathBuf>> {
        self.suggested
            .lock()
            .expect("suggested lock")
            .push(suggested_name.to_string());
        match &self.behavior {
            DialogBehavior::Choose(path) => Ok(Some(path.clone())),
            DialogBehavior::Dismiss => Ok(None),
            DialogBehavior::Fail => Err(ClientError::Dialog("portal unavailable".into())),
        }
    }
}

fn leftover_part_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "part"))
        .collect()
}

#[tokio::test]
async fn directory_sink_writes_archive_and_reports_offered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path().join("downloads"));

    let outcome = sink
        .deliver("Util_completo.zip", b"PK\x03\x04zip")
        .await
        .expect("deliver");

    let expected = dir.path().join("downloads").join("Util_completo.zip");
    assert_eq!(outcome, DeliveryOutcome::Offered(expected.clone()));
    assert_eq!(std::fs::read(&expected).expect("read"), b"PK\x03\x04zip");
    assert!(leftover_part_files(&dir.path().join("downloads")).is_empty());
}

#[tokio::test]
async fn directory_sink_never_overwrites_existing_downloads() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("Util_completo.zip"), b"old").expect("seed");
    let sink = DirectorySink::new(dir.path());

    let outcome = sink
        .deliver("Util_completo.zip", b"new")
        .await
        .expect("deliver");

    assert_eq!(outcome.path(), dir.path().join("Util_completo(1).zip"));
    assert_eq!(
        std::fs::read(dir.path().join("Util_completo.zip")).expect("read"),
        b"old"
    );
}

#[tokio::test]
async fn directory_sink_strips_path_components_from_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());

    let outcome = sink
        .deliver("../escape/Util_seleccionadas.zip", b"zip")
        .await
        .expect("deliver");
    assert_eq!(outcome.path(), dir.path().join("Util_seleccionadas.zip"));

    let outcome = sink.deliver("  ", b"zip").await.expect("deliver");
    assert_eq!(outcome.path(), dir.path().join(FALLBACK_FILE_NAME));
}

#[tokio::test]
async fn dialog_sink_reports_saved_when_location_confirmed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chosen = dir.path().join("picked.zip");
    let sink = DialogSink::new(
        FakeDialog::new(DialogBehavior::Choose(chosen.clone())),
        DirectorySink::new(dir.path().join("fallback")),
    );

    let outcome = sink
        .deliver("Util_completo.zip", b"zip")
        .await
        .expect("deliver");

    assert_eq!(outcome, DeliveryOutcome::Saved(chosen.clone()));
    assert_eq!(std::fs::read(chosen).expect("read"), b"zip");
    assert!(leftover_part_files(dir.path()).is_empty());
    assert!(!dir.path().join("fallback").exists());
    assert_eq!(
        *sink.dialog.suggested.lock().expect("lock"),
        vec!["Util_completo.zip".to_string()]
    );
}

#[tokio::test]
async fn dialog_sink_falls_back_when_dismissed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DialogSink::new(
        FakeDialog::new(DialogBehavior::Dismiss),
        DirectorySink::new(dir.path()),
    );

    let outcome = sink
        .deliver("Util_seleccionadas.zip", b"zip")
        .await
        .expect("deliver");

    assert_eq!(
        outcome,
        DeliveryOutcome::Offered(dir.path().join("Util_seleccionadas.zip"))
    );
}

#[tokio::test]
async fn dialog_sink_falls_back_when_dialog_fails_or_write_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let failing = DialogSink::new(
        FakeDialog::new(DialogBehavior::Fail),
        DirectorySink::new(dir.path()),
    );
    let outcome = failing
        .deliver("a.zip", b"zip")
        .await
        .expect("deliver");
    assert_eq!(outcome, DeliveryOutcome::Offered(dir.path().join("a.zip")));

    let unwritable = DialogSink::new(
        FakeDialog::new(DialogBehavior::Choose(
            dir.path().join("missing-dir").join("b.zip"),
        )),
        DirectorySink::new(dir.path()),
    );
    let outcome = unwritable
        .deliver("b.zip", b"zip")
        .await
        .expect("deliver");
    assert_eq!(outcome, DeliveryOutcome::Offered(dir.path().join("b.zip")));
}

#[tokio::test]
async fn failed_dialog_write_leaves_nothing_at_chosen_location() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocked = dir.path().join("picked.zip");
    std::fs::create_dir(&blocked).expect("directory in the way");
    let sink = DialogSink::new(
        FakeDialog::new(DialogBehavior::Choose(blocked.clone())),
        DirectorySink::new(dir.path().join("fallback")),
    );

    let outcome = sink.deliver("picked.zip", b"zip").await.expect("deliver");

    assert_eq!(
        outcome,
        DeliveryOutcome::Offered(dir.path().join("fallback").join("picked.zip"))
    );
    assert!(blocked.is_dir());
    assert!(leftover_part_files(dir.path()).is_empty());
}
