use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use semwatch::errors::{Result, WatcherError};
use semwatch::source::{RawEventSource, RawNotification, RawStreams};
use semwatch::{FileWatcher, WatchStreams, WatcherOptions};

/// A call made against the fake source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Watch(PathBuf),
    Unwatch(PathBuf),
    Close,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<SourceCall>,
    fail_watch: HashSet<PathBuf>,
    fail_unwatch: HashSet<PathBuf>,
}

/// A raw source that:
/// - records every watch/unwatch/close call
/// - fails registration for paths the test marked as failing
/// - never produces notifications on its own; the test injects them
///   through the paired [`FakeSourceHandle`].
#[derive(Debug)]
pub struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

/// Test-side control over a [`FakeSource`].
#[derive(Debug, Clone)]
pub struct FakeSourceHandle {
    state: Arc<Mutex<FakeState>>,
    notifications: mpsc::UnboundedSender<RawNotification>,
    errors: mpsc::UnboundedSender<WatcherError>,
}

impl FakeSource {
    pub fn new() -> (FakeSource, FakeSourceHandle, RawStreams) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let (notifications, notifications_rx) = mpsc::unbounded_channel();
        let (errors, errors_rx) = mpsc::unbounded_channel();

        let source = FakeSource {
            state: Arc::clone(&state),
        };
        let handle = FakeSourceHandle {
            state,
            notifications,
            errors,
        };
        let streams = RawStreams {
            notifications: notifications_rx,
            errors: errors_rx,
        };
        (source, handle, streams)
    }
}

impl RawEventSource for FakeSource {
    fn watch(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_watch.contains(path) {
            return Err(WatcherError::Other(anyhow!("fake watch failure for {:?}", path)));
        }
        state.calls.push(SourceCall::Watch(path.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_unwatch.contains(path) {
            return Err(WatcherError::Other(anyhow!("fake unwatch failure for {:?}", path)));
        }
        state.calls.push(SourceCall::Unwatch(path.to_path_buf()));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().calls.push(SourceCall::Close);
        Ok(())
    }
}

impl FakeSourceHandle {
    pub fn send(&self, raw: RawNotification) {
        self.notifications
            .send(raw)
            .expect("classifier dropped its notification stream");
    }

    pub fn send_all(&self, raws: impl IntoIterator<Item = RawNotification>) {
        for raw in raws {
            self.send(raw);
        }
    }

    /// Like `send`, but tolerates a classifier that already stopped.
    pub fn try_send(&self, raw: RawNotification) -> bool {
        self.notifications.send(raw).is_ok()
    }

    pub fn send_error(&self, err: WatcherError) {
        self.errors
            .send(err)
            .expect("classifier dropped its error stream");
    }

    pub fn fail_watch(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().fail_watch.insert(path.into());
    }

    pub fn fail_unwatch(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().fail_unwatch.insert(path.into());
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn watch_calls(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.calls()
            .iter()
            .filter(|c| matches!(c, SourceCall::Watch(p) if p == path))
            .count()
    }

    pub fn close_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SourceCall::Close))
            .count()
    }
}

/// A running `FileWatcher` over a `FakeSource`, plus everything a test
/// needs to drive and observe it.
pub struct FakeWatcher {
    pub watcher: FileWatcher<FakeSource>,
    pub streams: WatchStreams,
    pub source: FakeSourceHandle,
    pub shutdown: Option<oneshot::Sender<()>>,
}

impl FakeWatcher {
    /// Must be called inside a Tokio runtime.
    pub fn start(options: WatcherOptions) -> Self {
        let (source, handle, raw) = FakeSource::new();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (watcher, streams) = FileWatcher::with_source(source, raw, shutdown_rx, options);
        Self {
            watcher,
            streams,
            source: handle,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
