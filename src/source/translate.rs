// src/source/translate.rs

//! Translation from `notify` events to raw operation bits.
//!
//! `notify` reports intent (`Create`, `Remove`, `Modify(Name(..))`, ...)
//! rather than the per-path bits the classifier works on, and some backends
//! split one change across several events. [`translate_event`] is the
//! stateless mapping; [`EventTranslator`] wraps it with the little state
//! needed to stitch split changes back together.

use std::path::PathBuf;
use std::time::Duration;

use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use tokio::time::Instant;
use tracing::trace;

use crate::fs::FileSystem;

use super::{RawNotification, RawOps};

/// How long a file removal or an outgoing move waits for its partner event
/// before it is reported on its own.
pub const PAIRING_WINDOW: Duration = Duration::from_millis(50);

/// Map one `notify` event onto raw bits.
///
/// A rename pair becomes a CREATE for the new path followed by a RENAME for
/// the old one, mirroring the order kqueue-style backends deliver them in.
pub fn translate_event(event: &Event, fs: &dyn FileSystem) -> Vec<RawNotification> {
    let single = |ops: RawOps| -> Vec<RawNotification> {
        event
            .paths
            .iter()
            .map(|p| RawNotification::new(p.clone(), ops))
            .collect()
    };

    let out = match &event.kind {
        EventKind::Create(_) => single(RawOps::CREATE),
        EventKind::Remove(RemoveKind::Folder) => single(RawOps::REMOVE | RawOps::RENAME),
        EventKind::Remove(_) => single(RawOps::RENAME),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() >= 2 => {
            let (old, new) = (&event.paths[0], &event.paths[1]);
            let mut old_ops = RawOps::RENAME;
            if fs.is_dir(new) {
                old_ops |= RawOps::REMOVE;
            }
            vec![
                RawNotification::new(new.clone(), RawOps::CREATE),
                RawNotification::new(old.clone(), old_ops),
            ]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => single(RawOps::RENAME),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => single(RawOps::CREATE),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let ops = if fs.exists(p) {
                    RawOps::CREATE
                } else {
                    RawOps::RENAME
                };
                RawNotification::new(p.clone(), ops)
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => single(RawOps::CHMOD),
        EventKind::Modify(_) => single(RawOps::WRITE),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    };

    trace!(?event, translated = out.len(), "translated notify event");
    out
}

/// A path held back while waiting for a partner event.
#[derive(Debug, Clone)]
struct Held {
    path: PathBuf,
    since: Instant,
    /// Tracker cookie of an outgoing move; `None` for a plain removal.
    cookie: Option<usize>,
}

/// What the classifier's newest buffered notification looks like, as far as
/// pairing decisions here are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Tail {
    Empty,
    Create(PathBuf, Instant),
    Remove,
}

/// Stateful translation on top of [`translate_event`].
///
/// - inotify reports a rename as `From`, `To` and `Both` sharing a tracker
///   cookie. A tracked `From` is held, the matching `To` is dropped and the
///   `Both` yields the CREATE/RENAME pair.
/// - A file removal that lands while a create is still waiting on the
///   classifier's delay becomes REMOVE, so the pair is read as a rapid
///   create/delete.
/// - Any other file removal is held. A create of the same path within
///   [`PAIRING_WINDOW`] turns it into a REMOVE/CREATE pair (an edit by
///   replacement); otherwise it is released as RENAME, a plain delete.
/// - A held outgoing move with no partner is released as RENAME once the
///   window passes.
///
/// Held paths are released either by the next event or by
/// [`EventTranslator::flush_expired`] at [`EventTranslator::deadline`].
#[derive(Debug)]
pub struct EventTranslator {
    held: Option<Held>,
    tail: Tail,
    create_delay: Duration,
}

impl EventTranslator {
    /// `create_delay` must match the classifier's: it bounds how long a
    /// create counts as still pending.
    pub fn new(create_delay: Duration) -> Self {
        Self {
            held: None,
            tail: Tail::Empty,
            create_delay,
        }
    }

    pub fn translate(
        &mut self,
        event: &Event,
        fs: &dyn FileSystem,
        now: Instant,
    ) -> Vec<RawNotification> {
        let mut out = Vec::new();

        match (&event.kind, event.attrs.tracker()) {
            (EventKind::Modify(ModifyKind::Name(RenameMode::From)), Some(cookie)) => {
                self.flush(&mut out);
                if let Some(path) = event.paths.first() {
                    self.held = Some(Held {
                        path: path.clone(),
                        since: now,
                        cookie: Some(cookie),
                    });
                }
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::To)), Some(cookie))
                if self.holds_move(cookie) => {}
            (EventKind::Modify(ModifyKind::Name(RenameMode::Both)), _) => {
                match self.held.as_ref().and_then(|h| h.cookie) {
                    Some(_) => self.held = None,
                    None => self.flush(&mut out),
                }
                self.push_all(&mut out, translate_event(event, fs), now);
            }
            (EventKind::Remove(kind), _) if *kind != RemoveKind::Folder => {
                for path in &event.paths {
                    self.flush(&mut out);
                    if self.create_pending(now) {
                        self.push(&mut out, RawNotification::new(path.clone(), RawOps::REMOVE), now);
                    } else {
                        self.held = Some(Held {
                            path: path.clone(),
                            since: now,
                            cookie: None,
                        });
                    }
                }
            }
            (EventKind::Create(_), _) if self.holds_removal_of(event) => {
                if let Some(held) = self.held.take() {
                    self.push(&mut out, RawNotification::new(held.path, RawOps::REMOVE), now);
                }
                self.push_all(&mut out, translate_event(event, fs), now);
            }
            _ => {
                self.flush(&mut out);
                self.push_all(&mut out, translate_event(event, fs), now);
            }
        }

        out
    }

    /// When the held path (if any) must be released.
    pub fn deadline(&self) -> Option<Instant> {
        self.held.as_ref().map(|h| h.since + PAIRING_WINDOW)
    }

    /// Release the held path if its window has passed.
    pub fn flush_expired(&mut self, now: Instant) -> Vec<RawNotification> {
        let mut out = Vec::new();
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.flush(&mut out);
        }
        out
    }

    /// Release whatever is held, regardless of its window.
    pub fn flush_all(&mut self) -> Vec<RawNotification> {
        let mut out = Vec::new();
        self.flush(&mut out);
        out
    }

    fn holds_move(&self, cookie: usize) -> bool {
        matches!(&self.held, Some(Held { cookie: Some(held), .. }) if *held == cookie)
    }

    fn holds_removal_of(&self, event: &Event) -> bool {
        match (&self.held, event.paths.first()) {
            (Some(Held { cookie: None, path, .. }), Some(created)) => path == created,
            _ => false,
        }
    }

    fn create_pending(&self, now: Instant) -> bool {
        match &self.tail {
            Tail::Create(_, at) => now.saturating_duration_since(*at) < self.create_delay,
            _ => false,
        }
    }

    fn flush(&mut self, out: &mut Vec<RawNotification>) {
        if let Some(held) = self.held.take() {
            let now = held.since;
            self.push(out, RawNotification::new(held.path, RawOps::RENAME), now);
        }
    }

    fn push_all(&mut self, out: &mut Vec<RawNotification>, raws: Vec<RawNotification>, now: Instant) {
        for raw in raws {
            self.push(out, raw, now);
        }
    }

    /// Append `raw` and track how the classifier's buffer will end up.
    fn push(&mut self, out: &mut Vec<RawNotification>, raw: RawNotification, now: Instant) {
        if !raw.has(RawOps::CHMOD) {
            self.tail = if raw.has(RawOps::RENAME) {
                Tail::Empty
            } else if raw.has(RawOps::CREATE) {
                match self.tail {
                    Tail::Remove => Tail::Empty,
                    _ => Tail::Create(raw.path.clone(), now),
                }
            } else if raw.has(RawOps::REMOVE) {
                match self.tail {
                    Tail::Create(..) => Tail::Empty,
                    _ => Tail::Remove,
                }
            } else {
                Tail::Empty
            };
        }
        out.push(raw);
    }
}
