// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::instrument::WithSubscriber;
use tracing::{debug, dispatcher, info, Dispatch};

use crate::classify::{ClassifierRuntime, EventClassifier, WatchStreams};
use crate::errors::{Result, WatcherError};
use crate::fs::FileSystem;
use crate::source::{NotifySource, RawEventSource, RawStreams};
use crate::watch::options::WatcherOptions;
use crate::watch::registry::WatchRegistry;

/// Watches a set of paths and classifies their changes.
///
/// Constructing a watcher spawns the classifier loop on the current Tokio
/// runtime. The loop stops when the caller's shutdown signal fires, when
/// [`FileWatcher::close`] is called, or when this value is dropped.
pub struct FileWatcher<S: RawEventSource = NotifySource> {
    source: Arc<Mutex<S>>,
    registry: WatchRegistry,
    fs: Arc<dyn FileSystem>,
    dispatch: Dispatch,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl<S: RawEventSource> std::fmt::Debug for FileWatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl FileWatcher<NotifySource> {
    /// Create a watcher backed by `notify`.
    ///
    /// - `shutdown` stops the loop and closes the source when it fires.
    ///   Dropping its sender does not stop anything.
    /// - `options` carries the filesystem, logger and classifier settings.
    ///
    /// Fails if the OS watch backend cannot be created. Must be called from
    /// within a Tokio runtime.
    pub fn init(
        shutdown: oneshot::Receiver<()>,
        options: WatcherOptions,
    ) -> Result<(Self, WatchStreams)> {
        let (source, raw) = NotifySource::new(Arc::clone(&options.fs), options.create_delay)?;
        Ok(Self::with_source(source, raw, shutdown, options))
    }
}

impl<S: RawEventSource> FileWatcher<S> {
    /// Create a watcher on top of an arbitrary raw source.
    pub fn with_source(
        source: S,
        raw: RawStreams,
        shutdown: oneshot::Receiver<()>,
        options: WatcherOptions,
    ) -> (Self, WatchStreams) {
        let dispatch = options
            .logger
            .clone()
            .unwrap_or_else(|| dispatcher::get_default(|current| current.clone()));

        let source = Arc::new(Mutex::new(source));
        let (stop_tx, stop_rx) = oneshot::channel();

        let core = EventClassifier::new(options.noise, options.missing_on_create);
        let (runtime, streams) = ClassifierRuntime::new(
            core,
            Arc::clone(&options.fs),
            options.create_delay,
            Arc::clone(&source),
            raw,
            shutdown,
            stop_rx,
        );

        tokio::spawn(runtime.run().with_subscriber(dispatch.clone()));

        let watcher = Self {
            source,
            registry: WatchRegistry::new(),
            fs: options.fs,
            dispatch,
            stop_tx: Mutex::new(Some(stop_tx)),
        };
        (watcher, streams)
    }

    /// Start watching `path`.
    ///
    /// - Already registered: no-op.
    /// - Directory: registered with the source and recorded.
    /// - File: skipped when its parent directory is already registered,
    ///   otherwise registered individually.
    ///
    /// Nothing is recorded if the source rejects the path.
    pub fn add(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        dispatcher::with_default(&self.dispatch, || self.add_inner(path))
    }

    fn add_inner(&self, path: &Path) -> Result<()> {
        let mut source = self.lock_source()?;

        if self.registry.contains(path) {
            debug!(?path, "already watching");
            return Ok(());
        }

        let stat = self.fs.stat(path);
        if !stat.exists {
            return Err(WatcherError::PathNotFound(path.to_path_buf()));
        }

        if !stat.is_dir {
            if let Some(dir) = containing_dir(path) {
                if self.registry.contains(dir) {
                    debug!(?path, ?dir, "containing directory already watched");
                    return Ok(());
                }
            }
        }

        source.watch(path)?;
        self.registry.set(path.to_path_buf());
        info!(?path, is_dir = stat.is_dir, "watching path");
        Ok(())
    }

    /// Stop watching `path`. Unknown paths are a no-op; if the source fails
    /// to unregister, the path stays registered.
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        dispatcher::with_default(&self.dispatch, || {
            let mut source = self.lock_source()?;
            if !self.registry.contains(path) {
                return Ok(());
            }
            source.unwatch(path)?;
            self.registry.remove(path);
            info!(?path, "stopped watching path");
            Ok(())
        })
    }

    /// Whether `path` itself is registered. Never touches the source or the
    /// filesystem.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.registry.contains(path.as_ref())
    }

    /// Sorted snapshot of registered paths.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.registry.paths()
    }

    /// Stop the classifier loop and close the raw source.
    ///
    /// Repeated calls are forwarded to the source, whose own contract
    /// decides whether they fail (`NotifySource` returns `Ok`).
    pub fn close(&self) -> Result<()> {
        let stop = self
            .stop_tx
            .lock()
            .map_err(|_| WatcherError::LockPoisoned("stop signal"))?
            .take();
        if let Some(stop) = stop {
            let _ = stop.send(());
        }

        dispatcher::with_default(&self.dispatch, || {
            debug!("closing raw event source");
            self.lock_source()?.close()
        })
    }

    fn lock_source(&self) -> Result<MutexGuard<'_, S>> {
        self.source
            .lock()
            .map_err(|_| WatcherError::LockPoisoned("raw source"))
    }
}

/// Directory holding `path`. A bare relative name such as `a.txt` lives in
/// `.`, not in the empty path `Path::parent` returns.
fn containing_dir(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Some(Path::new(".")),
        other => other,
    }
}
