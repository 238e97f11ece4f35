// src/source/notify_source.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::errors::{Result, WatcherError};
use crate::fs::FileSystem;

use super::translate::EventTranslator;
use super::{RawEventSource, RawNotification, RawStreams};

/// Raw source backed by `notify::RecommendedWatcher`.
///
/// Dropping the inner watcher (via [`RawEventSource::close`] or by dropping
/// this value) stops the backend, which ends the translation task and closes
/// both [`RawStreams`].
pub struct NotifySource {
    inner: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource")
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

impl NotifySource {
    /// Build the backend watcher and spawn the task translating its events.
    ///
    /// - `fs` tells folders from files at the new location of a rename.
    /// - `create_delay` is the classifier's create delay; a file removal
    ///   inside it counts as a rapid create/delete.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(fs: Arc<dyn FileSystem>, create_delay: Duration) -> Result<(Self, RawStreams)> {
        // Channel from the blocking notify callback into the async world.
        let (backend_tx, backend_rx) = mpsc::unbounded_channel::<Event>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<RawNotification>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<WatcherError>();

        // Called synchronously on notify's backend thread.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = backend_tx.send(event);
                }
                Err(err) => {
                    let _ = error_tx.send(WatcherError::Notify(err));
                }
            },
            Config::default(),
        )?;

        tokio::spawn(translate_loop(
            backend_rx,
            fs,
            EventTranslator::new(create_delay),
            event_tx,
        ));

        let streams = RawStreams {
            notifications: event_rx,
            errors: error_rx,
        };
        Ok((
            Self {
                inner: Some(watcher),
            },
            streams,
        ))
    }

    fn watcher_mut(&mut self) -> Result<&mut RecommendedWatcher> {
        self.inner.as_mut().ok_or(WatcherError::SourceClosed)
    }
}

impl RawEventSource for NotifySource {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.watcher_mut()?.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher_mut()?.unwatch(path)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.inner.take().is_some() {
            debug!("notify backend closed");
        }
        Ok(())
    }
}

/// Translate backend events until the backend goes away, releasing held
/// paths when their pairing window passes.
async fn translate_loop(
    mut backend: mpsc::UnboundedReceiver<Event>,
    fs: Arc<dyn FileSystem>,
    mut translator: EventTranslator,
    out: mpsc::UnboundedSender<RawNotification>,
) {
    loop {
        let deadline = translator.deadline();
        let raws = tokio::select! {
            maybe = backend.recv() => match maybe {
                Some(event) => translator.translate(&event, fs.as_ref(), Instant::now()),
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                translator.flush_expired(Instant::now())
            }
        };

        for raw in raws {
            if out.send(raw).is_err() {
                // Classifier is gone; nothing left to feed.
                return;
            }
        }
    }

    for raw in translator.flush_all() {
        let _ = out.send(raw);
    }
    debug!("notify translation loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::source::RawOps;
    use notify::event::{CreateKind, RemoveKind};
    use notify::EventKind;
    use std::path::PathBuf;

    fn ev(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    fn spawn_loop() -> (
        mpsc::UnboundedSender<Event>,
        mpsc::UnboundedReceiver<RawNotification>,
        tokio::task::JoinHandle<()>,
    ) {
        let (backend_tx, backend_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(translate_loop(
            backend_rx,
            Arc::new(MockFileSystem::new()),
            EventTranslator::new(Duration::from_millis(125)),
            out_tx,
        ));
        (backend_tx, out_rx, task)
    }

    #[tokio::test]
    async fn closed_source_rejects_watch() {
        let fs = Arc::new(MockFileSystem::new());
        let (mut source, _streams) = NotifySource::new(fs, Duration::from_millis(125)).unwrap();
        source.close().unwrap();
        source.close().unwrap();
        assert!(matches!(
            source.watch(Path::new("/tmp")),
            Err(WatcherError::SourceClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn lone_removal_is_released_after_the_pairing_window() {
        let (backend_tx, mut out_rx, _task) = spawn_loop();

        backend_tx
            .send(ev(EventKind::Remove(RemoveKind::File), "/w/a"))
            .unwrap();
        assert_eq!(
            out_rx.recv().await,
            Some(RawNotification::new("/w/a", RawOps::RENAME))
        );

        backend_tx
            .send(ev(EventKind::Create(CreateKind::File), "/w/b"))
            .unwrap();
        assert_eq!(
            out_rx.recv().await,
            Some(RawNotification::new("/w/b", RawOps::CREATE))
        );

        drop(backend_tx);
        assert_eq!(out_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn held_removal_is_flushed_when_the_backend_ends() {
        let (backend_tx, mut out_rx, task) = spawn_loop();

        backend_tx
            .send(ev(EventKind::Remove(RemoveKind::File), "/w/a"))
            .unwrap();
        drop(backend_tx);
        task.await.unwrap();

        assert_eq!(
            out_rx.recv().await,
            Some(RawNotification::new("/w/a", RawOps::RENAME))
        );
        assert_eq!(out_rx.recv().await, None);
    }
}
