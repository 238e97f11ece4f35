// tests/classifier_sequences.rs
//
// Raw notification sequences driven through a running watcher over a fake
// source. Time is paused, so create-disambiguation timers fire as soon as
// every task is idle.

mod common;
use crate::common::builders::{
    chmod, create, p, remove, remove_rename, rename, write, OptionsBuilder,
};
use crate::common::{assert_no_event, init_tracing, next_event};

use std::error::Error;
use std::sync::Arc;

use semwatch::fs::mock::MockFileSystem;
use semwatch::{ChangeKind, FileWatcherEvent};
use semwatch_test_utils::{CapturedLogs, FakeWatcher};

type TestResult = Result<(), Box<dyn Error>>;

fn start(fs: &MockFileSystem) -> FakeWatcher {
    init_tracing();
    FakeWatcher::start(OptionsBuilder::new(Arc::new(fs.clone())).build())
}

#[tokio::test(start_paused = true)]
async fn bare_create_resolves_to_file_or_folder() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/a.txt", "x");
    fs.add_dir("/w/sub");
    let mut fw = start(&fs);

    fw.source.send(create("/w/a.txt"));
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFile, "/w/a.txt")
    );

    fw.source.send(create("/w/sub"));
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFolder, "/w/sub")
    );

    assert_no_event(&mut fw.streams, 1_000).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn create_is_not_emitted_before_the_delay() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/a.txt", "x");
    let mut fw = start(&fs);

    fw.source.send(create("/w/a.txt"));
    assert_no_event(&mut fw.streams, 100).await;
    assert_eq!(next_event(&mut fw.streams).await.kind, ChangeKind::CreateFile);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn create_then_rename_is_a_file_rename() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/b.txt", "x");
    fs.add_file("/w/c.txt", "y");
    let mut fw = start(&fs);

    fw.source.send_all([create("/w/b.txt"), rename("/w/a.txt")]);
    let event = next_event(&mut fw.streams).await;
    assert_eq!(event.kind, ChangeKind::RenameFile);
    assert_eq!(event.path, p("/w/b.txt"));
    assert_eq!(event.previous_path(), Some(p("/w/a.txt").as_path()));

    // The create timer armed for b.txt is stale by now.
    assert_no_event(&mut fw.streams, 1_000).await;

    // A later create does not pair with anything left over.
    fw.source.send(create("/w/c.txt"));
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFile, "/w/c.txt")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn create_then_remove_rename_is_a_folder_rename() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w/new_dir");
    let mut fw = start(&fs);

    fw.source
        .send_all([create("/w/new_dir"), remove_rename("/w/old_dir")]);
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::renamed(ChangeKind::RenameFolder, "/w/new_dir", "/w/old_dir")
    );
    assert_no_event(&mut fw.streams, 1_000).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deletes_are_emitted_immediately() -> TestResult {
    let mut fw = start(&MockFileSystem::new());

    fw.source.send(remove_rename("/w/dir"));
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::DeleteFolder, "/w/dir")
    );

    fw.source.send(rename("/w/file.txt"));
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::DeleteFile, "/w/file.txt")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn remove_then_create_is_an_edit() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/a.txt", "v2");
    let mut fw = start(&fs);

    fw.source.send_all([remove("/w/a.txt"), create("/w/a.txt")]);
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::EditFile, "/w/a.txt")
    );
    assert_no_event(&mut fw.streams, 1_000).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rapid_create_delete_emits_nothing_and_logs_debug() -> TestResult {
    let logs = CapturedLogs::new();
    let fs = MockFileSystem::new();
    let mut fw = FakeWatcher::start(
        OptionsBuilder::new(Arc::new(fs.clone()))
            .logger(logs.dispatch())
            .build(),
    );

    fw.source.send_all([create("/w/tmp"), remove("/w/tmp")]);
    assert_no_event(&mut fw.streams, 1_000).await;

    let debug = logs.lines_at("DEBUG");
    assert!(
        debug
            .iter()
            .any(|line| line.contains("\"/w/tmp\" was rapidly created and then removed")),
        "missing debug line in:\n{}",
        logs.contents()
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn create_then_remove_of_another_path_emits_nothing_and_logs_warn() -> TestResult {
    let logs = CapturedLogs::new();
    let mut fw = FakeWatcher::start(
        OptionsBuilder::new(Arc::new(MockFileSystem::new()))
            .logger(logs.dispatch())
            .build(),
    );

    fw.source.send_all([create("/w/a"), remove("/w/b")]);
    assert_no_event(&mut fw.streams, 1_000).await;

    let warnings: Vec<String> = logs
        .lines_at("WARN")
        .into_iter()
        .filter(|line| line.contains("unexpected series of events"))
        .collect();
    assert_eq!(warnings.len(), 1, "logs:\n{}", logs.contents());
    assert!(logs.lines_at("DEBUG").iter().all(|l| !l.contains("rapidly created")));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn chmod_passes_through_without_disturbing_a_pending_create() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/a.txt", "x");
    let mut fw = start(&fs);

    fw.source.send_all([create("/w/a.txt"), chmod("/w/other")]);
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::Chmod, "/w/other")
    );
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFile, "/w/a.txt")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn chmod_between_create_and_rename_keeps_the_pair() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/b.txt", "x");
    let mut fw = start(&fs);

    fw.source
        .send_all([create("/w/b.txt"), chmod("/w/b.txt"), rename("/w/a.txt")]);
    assert_eq!(next_event(&mut fw.streams).await.kind, ChangeKind::Chmod);
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::renamed(ChangeKind::RenameFile, "/w/b.txt", "/w/a.txt")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn restarted_timer_resolves_the_newest_create_once() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/a.txt", "x");
    fs.add_file("/w/b.txt", "y");
    let mut fw = start(&fs);

    fw.source.send(create("/w/a.txt"));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    fw.source.send(create("/w/b.txt"));

    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFile, "/w/b.txt")
    );
    assert_no_event(&mut fw.streams, 1_000).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_path_on_create_is_emitted_and_logged_by_default() -> TestResult {
    let logs = CapturedLogs::new();
    let mut fw = FakeWatcher::start(
        OptionsBuilder::new(Arc::new(MockFileSystem::new()))
            .logger(logs.dispatch())
            .build(),
    );

    fw.source.send(create("/w/ghost"));
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFile, "/w/ghost")
    );
    assert!(logs
        .lines_at("ERROR")
        .iter()
        .any(|line| line.contains("\"/w/ghost\" is missing")));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_path_on_create_can_be_suppressed() -> TestResult {
    let logs = CapturedLogs::new();
    let mut fw = FakeWatcher::start(
        OptionsBuilder::new(Arc::new(MockFileSystem::new()))
            .suppress_missing_creates()
            .logger(logs.dispatch())
            .build(),
    );

    fw.source.send(create("/w/ghost"));
    assert_no_event(&mut fw.streams, 1_000).await;
    assert_eq!(logs.lines_at("ERROR").len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unclassifiable_write_is_logged_as_unknown() -> TestResult {
    let logs = CapturedLogs::new();
    let mut fw = FakeWatcher::start(
        OptionsBuilder::new(Arc::new(MockFileSystem::new()))
            .logger(logs.dispatch())
            .build(),
    );

    fw.source.send(write("/w/a.txt"));
    assert_no_event(&mut fw.streams, 1_000).await;
    assert!(logs
        .lines_at("WARN")
        .iter()
        .any(|line| line.contains("unknown event")));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn noise_paths_are_dropped_before_classification() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/.DS_Store", "");
    fs.add_file("/w/real.txt", "x");
    let mut fw = start(&fs);

    fw.source.send_all([
        create("/w/.DS_Store"),
        chmod("/w/.DS_Store"),
        create("/w/real.txt"),
    ]);
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::CreateFile, "/w/real.txt")
    );
    assert_no_event(&mut fw.streams, 1_000).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn custom_ignore_patterns_replace_the_default() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/w/.a.swp", "");
    let mut fw = FakeWatcher::start(
        OptionsBuilder::new(Arc::new(fs.clone()))
            .ignore(&["**/*.swp"])
            .build(),
    );

    fw.source.send_all([create("/w/.a.swp"), chmod("/w/.DS_Store")]);
    assert_eq!(
        next_event(&mut fw.streams).await,
        FileWatcherEvent::new(ChangeKind::Chmod, "/w/.DS_Store")
    );
    assert_no_event(&mut fw.streams, 1_000).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_consumer_still_sees_every_event_in_order() -> TestResult {
    let mut fw = start(&MockFileSystem::new());

    fw.source
        .send_all([chmod("/w/1"), chmod("/w/2"), rename("/w/3"), chmod("/w/4")]);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(next_event(&mut fw.streams).await.path);
    }
    assert_eq!(seen, vec![p("/w/1"), p("/w/2"), p("/w/3"), p("/w/4")]);
    Ok(())
}
