//! File-backed tests for the tracker: subject layout, repair on load,
//! toggles, and graph reloads.

use pathwise_core::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

const DIAMOND: &str = r#"
digraph Diamond {
    node [shape=box];
    A [label="Foundations"];
    A -> B;
    A -> C;
    B -> D;
    C -> D;
}
"#;

/// Helper: create a subject directory with a graph and optional progress.
fn write_subject(root: &Path, name: &str, graph: &str, progress: Option<&str>) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("graph.txt"), graph).unwrap();
    if let Some(progress) = progress {
        fs::write(dir.join("progress.json"), progress).unwrap();
    }
}

fn read_progress(root: &Path, name: &str) -> CompletionSet {
    let text = fs::read_to_string(root.join(name).join("progress.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn tracker(root: &Path) -> Tracker {
    Tracker::new(SubjectCatalog::new(root))
}

#[test]
fn first_load_creates_default_progress() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "dl", DIAMOND, None);

    let snapshot = tracker(root.path()).snapshot("dl").unwrap();

    assert_eq!(snapshot.progress.len(), 4);
    assert_eq!(snapshot.percent, 0);
    assert_eq!(snapshot.states.get("A"), Some(Readiness::Ready));
    assert_eq!(snapshot.states.get("D"), Some(Readiness::Blocked));
    assert!(snapshot.repaired.is_some());
    assert_eq!(read_progress(root.path(), "dl"), snapshot.progress);
}

#[test]
fn out_of_sync_progress_is_repaired_on_disk() {
    let root = tempfile::tempdir().unwrap();
    write_subject(
        root.path(),
        "abc",
        "A; B; C;",
        Some(r#"{"A": true, "B": true, "D": true}"#),
    );

    let snapshot = tracker(root.path()).snapshot("abc").unwrap();

    let expected: CompletionSet = ["A", "B", "C"]
        .iter()
        .map(|id| (id.to_string(), false))
        .collect();
    assert_eq!(snapshot.progress, expected);
    assert_eq!(read_progress(root.path(), "abc"), expected);
    assert!(snapshot.repaired.unwrap().contains("unexpected: [D]"));
}

#[test]
fn snapshots_are_stable_without_toggles() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "dl", DIAMOND, None);
    let tracker = tracker(root.path());

    let first = tracker.snapshot("dl").unwrap();
    let second = tracker.snapshot("dl").unwrap();

    assert_eq!(first.progress, second.progress);
    assert!(second.repaired.is_none());
}

#[test]
fn toggle_persists_before_returning() {
    let root = tempfile::tempdir().unwrap();
    write_subject(
        root.path(),
        "dl",
        DIAMOND,
        Some(r#"{"A": true, "B": true, "C": true, "D": false}"#),
    );
    let tracker = tracker(root.path());

    let snapshot = tracker.toggle("dl", "D", true).unwrap();

    assert_eq!(snapshot.states.get("D"), Some(Readiness::Done));
    assert_eq!(snapshot.percent, 100);
    assert!(snapshot.warning.is_none());
    assert!(read_progress(root.path(), "dl").is_done("D"));

    let reloaded = tracker.snapshot("dl").unwrap();
    assert_eq!(reloaded.progress, snapshot.progress);
}

#[test]
fn toggle_off_reblocks_descendants() {
    let root = tempfile::tempdir().unwrap();
    write_subject(
        root.path(),
        "dl",
        DIAMOND,
        Some(r#"{"A": true, "B": true, "C": false, "D": false}"#),
    );

    let snapshot = tracker(root.path()).toggle("dl", "A", false).unwrap();
    assert_eq!(snapshot.states.get("A"), Some(Readiness::Ready));
    assert_eq!(snapshot.states.get("B"), Some(Readiness::Done));
    assert_eq!(snapshot.states.get("C"), Some(Readiness::Blocked));
    assert_eq!(snapshot.percent, 25);
}

#[test]
fn unknown_subject_and_topic_are_client_errors() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "dl", DIAMOND, None);
    let tracker = tracker(root.path());

    let err = tracker.snapshot("chemistry").unwrap_err();
    assert!(matches!(err, Error::UnknownSubject(ref s) if s == "chemistry"));
    assert!(err.is_client_error());

    let err = tracker.toggle("dl", "Z", true).unwrap_err();
    assert!(matches!(err, Error::UnknownTopic { ref topic, .. } if topic == "Z"));

    // The failed toggle wrote nothing new.
    assert!(!read_progress(root.path(), "dl").is_done("Z"));
}

#[test]
fn empty_graph_is_a_classified_failure() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "blank", "digraph G {\n  node [shape=box];\n}\n", None);

    let err = tracker(root.path()).snapshot("blank").unwrap_err();
    assert!(matches!(
        err,
        Error::Graph {
            source: GraphParseError::Empty,
            ..
        }
    ));
    assert!(!root.path().join("blank").join("progress.json").exists());
}

#[test]
fn missing_graph_file_is_unreadable() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("nograph")).unwrap();

    let err = tracker(root.path()).snapshot("nograph").unwrap_err();
    assert!(matches!(
        err,
        Error::Graph {
            source: GraphParseError::Unreadable { .. },
            ..
        }
    ));
}

#[test]
fn edited_graph_is_reloaded_and_progress_resynced() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "dl", "A -> B;", None);
    let tracker = tracker(root.path());

    tracker.toggle("dl", "A", true).unwrap();

    let graph_path = root.path().join("dl").join("graph.txt");
    fs::write(&graph_path, "A -> B; B -> C;").unwrap();
    // Force a distinct modification time regardless of filesystem granularity.
    let file = fs::File::options().write(true).open(&graph_path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(5))
        .unwrap();
    drop(file);

    let snapshot = tracker.snapshot("dl").unwrap();
    assert_eq!(snapshot.graph.node_count(), 3);
    assert_eq!(snapshot.progress.len(), 3);
    assert_eq!(snapshot.progress.done_count(), 0, "key change regenerates");
    assert!(snapshot.repaired.is_some());
}

#[test]
fn subjects_are_independent() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "alpha", "A -> B;", None);
    write_subject(root.path(), "beta", "A -> B;", None);
    let tracker = tracker(root.path());

    tracker.toggle("alpha", "A", true).unwrap();

    assert!(tracker.snapshot("alpha").unwrap().progress.is_done("A"));
    assert!(!tracker.snapshot("beta").unwrap().progress.is_done("A"));
    assert_eq!(tracker.subjects().unwrap(), vec!["alpha", "beta"]);
}

#[test]
fn concurrent_toggles_do_not_lose_updates() {
    let root = tempfile::tempdir().unwrap();
    let topics: Vec<String> = (0..16).map(|i| format!("T{i}")).collect();
    let graph = topics.join(";\n");
    write_subject(root.path(), "many", &graph, None);
    let tracker = Arc::new(tracker(root.path()));
    tracker.snapshot("many").unwrap();

    let handles: Vec<_> = topics
        .iter()
        .cloned()
        .map(|topic| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || tracker.toggle("many", &topic, true).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = read_progress(root.path(), "many");
    assert_eq!(stored.done_count(), topics.len());
}

#[test]
fn snapshot_dot_feeds_layout() {
    let root = tempfile::tempdir().unwrap();
    write_subject(root.path(), "dl", DIAMOND, Some(r#"{"A": true, "B": false, "C": false, "D": false}"#));

    let snapshot = tracker(root.path()).snapshot("dl").unwrap();
    let dot = snapshot.dot(&DotStyle::default());

    assert!(dot.contains(r#""A" [label="Foundations", fillcolor=lightgreen"#));
    assert!(dot.contains(r#""B" [label="B", fillcolor=yellow"#));
    assert!(dot.contains(r#""D" [label="D", fillcolor=lightgrey"#));
}
