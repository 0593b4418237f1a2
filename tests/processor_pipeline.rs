// tests/processor_pipeline.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use foundation::config::ObserverConfiguration;
use foundation::fs::mock::MockFileSystem;
use foundation::types::ChangeKind;
use foundation::watch::{
    ChangeEvent, FileSystemChangeProcessor, FilterReason, ProcessOutcome,
};

const WINDOW: Duration = Duration::from_millis(200);

fn processor(fs: &MockFileSystem) -> FileSystemChangeProcessor {
    let cfg = ObserverConfiguration::builder(["/proj"])
        .include("**/*.rs")
        .exclude("target/**")
        .debounce(WINDOW)
        .build()
        .unwrap();
    FileSystemChangeProcessor::with_file_system(&cfg, Arc::new(fs.clone())).unwrap()
}

#[test]
fn rapid_modifications_collapse_into_one_notification() {
    let fs = MockFileSystem::new();
    let mut p = processor(&fs);
    let t0 = Instant::now();

    for i in 0..20u64 {
        let outcome = p.process_change(
            ChangeEvent::new("/proj/src/lib.rs", ChangeKind::Modify),
            t0 + Duration::from_millis(i * 5),
        );
        assert_eq!(outcome, ProcessOutcome::Deferred);
    }

    let due = p.flush_due(t0 + Duration::from_secs(5));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].relative_path, "src/lib.rs");
    assert_eq!(due[0].event_count, 20);
    assert_eq!(p.stats().received, 20);
    assert_eq!(p.stats().emitted, 1);
}

#[test]
fn filters_are_applied_before_debouncing() {
    let fs = MockFileSystem::new();
    let mut p = processor(&fs);
    let now = Instant::now();

    let cases = [
        ("/elsewhere/a.rs", FilterReason::OutsideRoots),
        ("/proj/README.md", FilterReason::NotIncluded),
        ("/proj/target/debug/build.rs", FilterReason::Excluded),
    ];
    for (path, reason) in cases {
        assert_eq!(
            p.process_change(ChangeEvent::new(path, ChangeKind::Modify), now),
            ProcessOutcome::Filtered(reason),
            "path {path}"
        );
    }
    assert_eq!(p.pending(), 0);
    assert_eq!(p.stats().filtered, 3);
}

#[test]
fn create_then_modify_is_reported_as_create() {
    let fs = MockFileSystem::new();
    let mut p = processor(&fs);
    let t0 = Instant::now();

    p.process_change(ChangeEvent::new("/proj/new.rs", ChangeKind::Create), t0);
    p.process_change(ChangeEvent::new("/proj/new.rs", ChangeKind::Modify), t0);

    let due = p.flush_due(t0 + WINDOW);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].kind, ChangeKind::Create);
}

#[test]
fn transient_file_produces_nothing() {
    let fs = MockFileSystem::new();
    let mut p = processor(&fs);
    let t0 = Instant::now();

    p.process_change(ChangeEvent::new("/proj/tmp.rs", ChangeKind::Create), t0);
    let outcome = p.process_change(ChangeEvent::new("/proj/tmp.rs", ChangeKind::Delete), t0);

    assert_eq!(outcome, ProcessOutcome::Filtered(FilterReason::Transient));
    assert!(p.flush_due(t0 + Duration::from_secs(5)).is_empty());
    assert_eq!(p.stats().suppressed, 1);
}

#[test]
fn delete_then_create_is_a_modification() {
    let fs = MockFileSystem::new();
    let mut p = processor(&fs);
    let t0 = Instant::now();

    p.process_change(ChangeEvent::new("/proj/a.rs", ChangeKind::Delete), t0);
    p.process_change(ChangeEvent::new("/proj/a.rs", ChangeKind::Create), t0);

    let due = p.flush_due(t0 + WINDOW);
    assert_eq!(due[0].kind, ChangeKind::Modify);
}

#[test]
fn separate_paths_are_debounced_independently() {
    let fs = MockFileSystem::new();
    let mut p = processor(&fs);
    let t0 = Instant::now();

    p.process_change(ChangeEvent::new("/proj/a.rs", ChangeKind::Modify), t0);
    p.process_change(
        ChangeEvent::new("/proj/b.rs", ChangeKind::Modify),
        t0 + Duration::from_millis(150),
    );

    let first = p.flush_due(t0 + WINDOW);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].relative_path, "a.rs");

    let second = p.flush_due(t0 + Duration::from_millis(350));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].relative_path, "b.rs");
}

#[test]
fn lock_file_events_are_never_reported() {
    let fs = MockFileSystem::new();
    let cfg = ObserverConfiguration::builder(["/proj"])
        .processing_lock_file(".processing.lock")
        .debounce(Duration::ZERO)
        .build()
        .unwrap();
    let mut p = FileSystemChangeProcessor::with_file_system(&cfg, Arc::new(fs.clone())).unwrap();

    let outcome = p.process_change(
        ChangeEvent::new("/proj/.processing.lock", ChangeKind::Create),
        Instant::now(),
    );
    assert_eq!(outcome, ProcessOutcome::Filtered(FilterReason::LockFile));
}
