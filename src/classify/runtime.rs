// src/classify/runtime.rs

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::WatcherError;
use crate::event::FileWatcherEvent;
use crate::fs::FileSystem;
use crate::source::{RawEventSource, RawNotification, RawStreams};

use super::core::{ClassifierStep, EventClassifier};

/// Consumer side of a running watcher: classified events and raw errors.
///
/// Both channels have capacity 1, so a consumer that stops reading stalls
/// classification (and, further up, draining of the raw source).
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::Receiver<FileWatcherEvent>,
    pub errors: mpsc::Receiver<WatcherError>,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Caller's shutdown signal fired.
    Shutdown,
    /// `FileWatcher::close` was called; the source is already closed.
    Closed,
    /// The owning `FileWatcher` was dropped.
    OwnerDropped,
    /// The consumer dropped the event receiver.
    ConsumerGone,
    /// The raw notification stream ended.
    SourceEnded,
}

enum Flow {
    Continue,
    Exit(Exit),
}

enum Delivery {
    Sent,
    ReceiverClosed,
    Exit(Exit),
}

/// Async shell around [`EventClassifier`].
///
/// Owns the raw streams, the disambiguation timer and the output channels,
/// and drives the classifier from a single task so the lookback buffer
/// never needs a lock.
pub struct ClassifierRuntime<S: RawEventSource> {
    core: EventClassifier,
    fs: Arc<dyn FileSystem>,
    create_delay: Duration,
    source: Arc<Mutex<S>>,
    raw: RawStreams,
    timer_tx: mpsc::Sender<()>,
    timer_rx: mpsc::Receiver<()>,
    pending_timer: Option<JoinHandle<()>>,
    events_tx: mpsc::Sender<FileWatcherEvent>,
    errors_tx: mpsc::Sender<WatcherError>,
    shutdown: oneshot::Receiver<()>,
    shutdown_live: bool,
    stop: oneshot::Receiver<()>,
}

impl<S: RawEventSource> fmt::Debug for ClassifierRuntime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRuntime")
            .field("core", &self.core)
            .field("create_delay", &self.create_delay)
            .finish_non_exhaustive()
    }
}

impl<S: RawEventSource> ClassifierRuntime<S> {
    pub fn new(
        core: EventClassifier,
        fs: Arc<dyn FileSystem>,
        create_delay: Duration,
        source: Arc<Mutex<S>>,
        raw: RawStreams,
        shutdown: oneshot::Receiver<()>,
        stop: oneshot::Receiver<()>,
    ) -> (Self, WatchStreams) {
        let (events_tx, events_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        // Single slot: a fire that finds one already queued is redundant.
        let (timer_tx, timer_rx) = mpsc::channel(1);

        let runtime = Self {
            core,
            fs,
            create_delay,
            source,
            raw,
            timer_tx,
            timer_rx,
            pending_timer: None,
            events_tx,
            errors_tx,
            shutdown,
            shutdown_live: true,
            stop,
        };
        let streams = WatchStreams {
            events: events_rx,
            errors: errors_rx,
        };
        (runtime, streams)
    }

    /// Main event loop.
    ///
    /// Shutdown and close are checked ahead of everything else, so once
    /// either fires no further event is classified or delivered.
    pub async fn run(mut self) {
        debug!("classifier loop started");

        let exit = loop {
            let flow = tokio::select! {
                biased;
                res = &mut self.shutdown, if self.shutdown_live => self.on_shutdown_signal(res),
                res = &mut self.stop => Flow::Exit(stop_reason(res)),
                Some(()) = self.timer_rx.recv() => self.on_timer().await,
                maybe = self.raw.notifications.recv() => match maybe {
                    Some(raw) => self.on_raw(raw).await,
                    None => Flow::Exit(Exit::SourceEnded),
                },
                Some(err) = self.raw.errors.recv() => self.forward_error(err).await,
            };

            if let Flow::Exit(exit) = flow {
                break exit;
            }
        };

        self.finish(exit);
    }

    fn on_shutdown_signal(&mut self, res: Result<(), oneshot::error::RecvError>) -> Flow {
        match res {
            Ok(()) => Flow::Exit(Exit::Shutdown),
            Err(_) => {
                // No signal can arrive any more; `close()` or dropping the
                // watcher still stops the loop.
                debug!("shutdown sender dropped");
                self.shutdown_live = false;
                Flow::Continue
            }
        }
    }

    async fn on_raw(&mut self, raw: RawNotification) -> Flow {
        match self.core.classify(raw) {
            ClassifierStep::Emit(event) => self.emit(event).await,
            ClassifierStep::ArmCreateTimer => {
                self.arm_create_timer();
                Flow::Continue
            }
            ClassifierStep::Idle => Flow::Continue,
        }
    }

    async fn on_timer(&mut self) -> Flow {
        match self.core.resolve_pending_create(self.fs.as_ref()) {
            Some(event) => self.emit(event).await,
            None => Flow::Continue,
        }
    }

    /// Start a fresh disambiguation timer.
    ///
    /// A previously armed timer keeps running; when it fires the classifier
    /// checks its pending flag and ignores the fire if the create was
    /// superseded.
    fn arm_create_timer(&mut self) {
        let tx = self.timer_tx.clone();
        let delay = self.create_delay;
        self.pending_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.try_send(());
        }));
    }

    async fn emit(&mut self, event: FileWatcherEvent) -> Flow {
        debug!(kind = %event.kind, path = ?event.path, previous = ?event.previous_path, "emitting event");
        let tx = self.events_tx.clone();
        match self.deliver(tx, event).await {
            Delivery::Sent => Flow::Continue,
            Delivery::ReceiverClosed => Flow::Exit(Exit::ConsumerGone),
            Delivery::Exit(exit) => Flow::Exit(exit),
        }
    }

    async fn forward_error(&mut self, err: WatcherError) -> Flow {
        let tx = self.errors_tx.clone();
        match self.deliver(tx, err).await {
            Delivery::Sent => Flow::Continue,
            Delivery::ReceiverClosed => {
                debug!("error receiver dropped; discarding raw error");
                Flow::Continue
            }
            Delivery::Exit(exit) => Flow::Exit(exit),
        }
    }

    /// Hand `value` to the consumer, waiting for room in the channel while
    /// still honouring shutdown and close.
    async fn deliver<T>(&mut self, tx: mpsc::Sender<T>, value: T) -> Delivery {
        let send = tx.send(value);
        tokio::pin!(send);

        loop {
            tokio::select! {
                biased;
                res = &mut self.shutdown, if self.shutdown_live => {
                    if let Flow::Exit(exit) = self.on_shutdown_signal(res) {
                        return Delivery::Exit(exit);
                    }
                }
                res = &mut self.stop => return Delivery::Exit(stop_reason(res)),
                res = &mut send => {
                    return match res {
                        Ok(()) => Delivery::Sent,
                        Err(_) => Delivery::ReceiverClosed,
                    };
                }
            }
        }
    }

    fn finish(mut self, exit: Exit) {
        if let Some(timer) = self.pending_timer.take() {
            timer.abort();
        }

        match exit {
            Exit::Shutdown | Exit::OwnerDropped | Exit::ConsumerGone => self.close_source(),
            Exit::Closed | Exit::SourceEnded => {}
        }

        info!(reason = ?exit, "classifier loop stopped");
    }

    fn close_source(&self) {
        match self.source.lock() {
            Ok(mut source) => {
                if let Err(err) = source.close() {
                    warn!(error = %err, "failed to close raw event source");
                }
            }
            Err(_) => warn!("raw source mutex poisoned; not closing"),
        }
    }
}

fn stop_reason(res: Result<(), oneshot::error::RecvError>) -> Exit {
    match res {
        Ok(()) => Exit::Closed,
        Err(_) => Exit::OwnerDropped,
    }
}
