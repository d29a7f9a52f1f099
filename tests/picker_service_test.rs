//! Integration tests for PickerService: fetch wiring, saving and analytics.

mod common;

use std::fs;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use common::{ids, n, path, set, FailingSink, MemorySource, RecordingAnalytics, RecordingSink};
use taxpick::application::services::{PickerOptions, PickerService};
use taxpick::application::ApplicationError;
use taxpick::domain::{DeselectKind, DomainError, SelectOutcome, SelectedSet};
use taxpick::infrastructure::store::JsonSelectionStore;
use taxpick::infrastructure::traits::RealFileSystem;
use taxpick::util::testing;

struct Fixture {
    picker: PickerService,
    source: Arc<MemorySource>,
    sink: Arc<RecordingSink>,
    analytics: Arc<RecordingAnalytics>,
}

async fn open_with(options: PickerOptions, initial: SelectedSet, source: MemorySource) -> Fixture {
    testing::init_test_setup();
    let source = Arc::new(source);
    let sink = Arc::new(RecordingSink::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let picker = PickerService::open(
        options,
        initial,
        source.clone(),
        sink.clone(),
        analytics.clone(),
    )
    .await
    .expect("open picker");
    Fixture {
        picker,
        source,
        sink,
        analytics,
    }
}

async fn open() -> Fixture {
    open_with(PickerOptions::default(), SelectedSet::new(), MemorySource::new()).await
}

#[tokio::test]
async fn given_new_picker_when_opened_then_roots_loaded() {
    let f = open().await;

    assert_eq!(
        ids(f.picker.state().displayed(1)),
        Some(vec!["a".into(), "x".into()])
    );
    assert_eq!(f.source.requests(), vec![(None, 0)]);
    assert_eq!(f.sink.count(), 0, "opening does not save");
}

#[tokio::test]
async fn given_root_when_selected_then_saved_and_children_loaded() {
    let mut f = open().await;

    f.picker.select(&n("a"), 1).await.unwrap();

    assert_eq!(f.sink.saves(), vec![set(&[&["a"]])]);
    assert_eq!(
        ids(f.picker.state().displayed(2)),
        Some(vec!["b".into(), "e".into()])
    );
    assert_eq!(f.source.requests().last(), Some(&(Some("a".to_string()), 1)));
}

#[tokio::test]
async fn given_full_walk_when_selecting_then_one_save_per_change() {
    let mut f = open().await;

    f.picker.select_ids(&["a", "b", "c"]).await.unwrap();

    let saves = f.sink.saves();
    assert_eq!(saves.len(), 3);
    assert_eq!(saves[2], set(&[&["a", "b", "c"]]));
    assert_eq!(f.picker.selected(), &set(&[&["a", "b", "c"]]));
}

#[tokio::test]
async fn given_highlighted_node_when_selected_again_then_no_save_but_tracked() {
    let mut f = open().await;
    f.picker.select(&n("a"), 1).await.unwrap();

    let outcome = f.picker.select(&n("a"), 1).await.unwrap();

    assert_eq!(outcome, SelectOutcome::Unchanged);
    assert_eq!(f.sink.count(), 1);
    assert_eq!(f.analytics.events().len(), 2);
}

#[tokio::test]
async fn given_subsumed_selection_when_browsing_then_still_saved() {
    let mut f = open_with(
        PickerOptions::default(),
        set(&[&["a", "b", "c"]]),
        MemorySource::new(),
    )
    .await;

    f.picker.select(&n("a"), 1).await.unwrap();

    assert_eq!(f.sink.saves(), vec![set(&[&["a", "b", "c"]])]);
}

#[rstest]
#[case(false, "Preprints - Submit - Discipline Add", "Preprints - Submit - Discipline Remove")]
#[case(true, "Preprints - Edit - Discipline Add", "Preprints - Edit - Discipline Remove")]
#[tokio::test]
async fn given_mode_when_acting_then_analytics_labels_match(
    #[case] edit_mode: bool,
    #[case] add: &str,
    #[case] remove: &str,
) {
    let options = PickerOptions {
        edit_mode,
        ..PickerOptions::default()
    };
    let mut f = open_with(options, SelectedSet::new(), MemorySource::new()).await;

    f.picker.select(&n("a"), 1).await.unwrap();
    f.picker.deselect(&path(&["a"])).unwrap();

    assert_eq!(f.analytics.labels(), vec![add.to_string(), remove.to_string()]);
    let event = &f.analytics.events()[0];
    assert_eq!(event.category, "button");
    assert_eq!(event.action, "click");
}

#[tokio::test]
async fn given_custom_prefix_when_selecting_then_label_uses_prefix() {
    let options = PickerOptions {
        label_prefix: "Registries".to_string(),
        ..PickerOptions::default()
    };
    let mut f = open_with(options, SelectedSet::new(), MemorySource::new()).await;

    f.picker.select(&n("x"), 1).await.unwrap();

    assert_eq!(
        f.analytics.labels(),
        vec!["Registries - Submit - Discipline Add".to_string()]
    );
}

#[tokio::test]
async fn given_invalid_select_when_called_then_error_and_nothing_saved() {
    let mut f = open().await;

    let err = f.picker.select(&n("c"), 3).await.unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NodeNotDisplayed { .. })
    ));
    assert_eq!(f.sink.count(), 0);
    assert_eq!(f.analytics.events().len(), 1, "attempt is still tracked");
}

#[tokio::test]
async fn given_selected_path_when_deselected_then_saved() {
    let mut f = open().await;
    f.picker.select_ids(&["a", "b"]).await.unwrap();

    let result = f.picker.deselect_ids(&["a", "b"]).unwrap().unwrap();

    assert_eq!(result.kind, DeselectKind::Truncated);
    assert_eq!(f.sink.saves().last(), Some(&set(&[&["a"]])));
    assert!(f.picker.state().displayed(3).is_none());
}

#[tokio::test]
async fn given_unknown_path_when_deselected_then_no_save() {
    let mut f = open().await;
    f.picker.select(&n("a"), 1).await.unwrap();

    assert!(f.picker.deselect_ids(&["x"]).unwrap().is_none());
    assert!(f.picker.deselect(&path(&["a", "b"])).unwrap().is_none());
    assert_eq!(f.sink.count(), 1);
}

#[tokio::test]
async fn given_unknown_id_when_selecting_ids_then_error() {
    let mut f = open().await;

    let err = f.picker.select_ids(&["a", "q"]).await.unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NodeNotDisplayed { ref id, tier: 2 }) if id == "q"
    ));
    assert_eq!(f.picker.selected(), &set(&[&["a"]]));
}

#[tokio::test]
async fn given_failing_backend_when_selecting_then_selection_kept_and_tier_empty() {
    let mut f = open_with(
        PickerOptions::default(),
        SelectedSet::new(),
        MemorySource::failing_for(&["e"]),
    )
    .await;
    f.picker.select(&n("a"), 1).await.unwrap();

    f.picker.select(&n("e"), 2).await.unwrap();

    assert_eq!(f.picker.selected(), &set(&[&["a", "e"]]));
    assert!(f.picker.state().displayed(3).is_none());
    assert_eq!(f.sink.count(), 2);
}

#[tokio::test]
async fn given_two_inflight_fetches_when_first_finishes_last_then_discarded() {
    let mut f = open().await;

    let first = f.picker.begin_select(&n("a"), 1).unwrap().ticket().cloned().unwrap();
    let slow = tokio::spawn(f.picker.fetch_task(first));

    let second = f.picker.begin_select(&n("x"), 1).unwrap().ticket().cloned().unwrap();
    let fast = f.picker.fetch_task(second).await;
    assert!(f.picker.deliver(fast));

    let late = slow.await.expect("join fetch");
    assert!(!f.picker.deliver(late));

    assert_eq!(ids(f.picker.state().displayed(2)), Some(vec!["y".into()]));
    assert_eq!(f.picker.selected(), &set(&[&["a"], &["x"]]));
}

#[tokio::test]
async fn given_json_store_when_selecting_then_file_holds_selection() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("out").join("subjects.json");
    let store = Arc::new(JsonSelectionStore::new(Arc::new(RealFileSystem), file.clone()));
    let mut picker = PickerService::open(
        PickerOptions::default(),
        SelectedSet::new(),
        Arc::new(MemorySource::new()),
        store.clone(),
        Arc::new(RecordingAnalytics::default()),
    )
    .await
    .unwrap();

    picker.select_ids(&["x", "y"]).await.unwrap();

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.contains("\"id\": \"y\""));
    assert_eq!(store.load().unwrap(), set(&[&["x", "y"]]));
}

#[tokio::test]
async fn given_invalid_depth_when_creating_then_error() {
    let result = PickerService::new(
        PickerOptions {
            depth: 0,
            ..PickerOptions::default()
        },
        SelectedSet::new(),
        Arc::new(MemorySource::new()),
        Arc::new(RecordingSink::default()),
        Arc::new(RecordingAnalytics::default()),
    );
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidDepth))
    ));
}

// ============================================================
// failing save sink
// ============================================================

async fn open_failing() -> (PickerService, Arc<FailingSink>) {
    testing::init_test_setup();
    let sink = Arc::new(FailingSink::default());
    let picker = PickerService::open(
        PickerOptions::default(),
        SelectedSet::new(),
        Arc::new(MemorySource::new()),
        sink.clone(),
        Arc::new(RecordingAnalytics::default()),
    )
    .await
    .unwrap();
    (picker, sink)
}

#[tokio::test]
async fn given_failing_sink_when_selecting_then_save_error_but_children_loaded() {
    let (mut picker, sink) = open_failing().await;

    let err = picker.select(&n("a"), 1).await.unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::OperationFailed { ref context, .. } if context == "save selection"
    ));
    assert_eq!(sink.attempts(), 1);
    assert_eq!(picker.selected(), &set(&[&["a"]]));
    assert_eq!(picker.state().highlighted(1), Some(&n("a")));
    assert_eq!(
        ids(picker.state().displayed(2)),
        Some(vec!["b".into(), "e".into()])
    );
}

#[tokio::test]
async fn given_failed_save_when_continuing_then_browsing_not_stuck() {
    let (mut picker, sink) = open_failing().await;
    assert!(picker.select(&n("a"), 1).await.is_err());

    assert_eq!(
        picker.select(&n("a"), 1).await.unwrap(),
        SelectOutcome::Unchanged
    );
    assert!(picker.select(&n("b"), 2).await.is_err());

    assert_eq!(picker.selected(), &set(&[&["a", "b"]]));
    assert_eq!(
        ids(picker.state().displayed(3)),
        Some(vec!["c".into(), "d".into()])
    );
    assert_eq!(sink.attempts(), 2, "unchanged select does not save");
}

#[tokio::test]
async fn given_failing_sink_when_beginning_select_then_ticket_still_returned() {
    let (mut picker, _sink) = open_failing().await;

    let step = picker.begin_select(&n("x"), 1).unwrap();

    assert!(step.saved.is_err());
    let ticket = step.ticket().cloned().expect("fetch ticket");
    let response = picker.fetch_task(ticket).await;
    assert!(picker.deliver(response));
    assert_eq!(ids(picker.state().displayed(2)), Some(vec!["y".into()]));
}

#[tokio::test]
async fn given_failing_sink_when_deselecting_then_state_changed_and_error_returned() {
    let (mut picker, _sink) = open_failing().await;
    let _ = picker.select(&n("a"), 1).await;

    let err = picker.deselect(&path(&["a"])).unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(picker.selected().is_empty());
}
