// src/classify/core.rs

//! Pure classification state machine.
//!
//! [`EventClassifier`] consumes [`RawNotification`]s one at a time and
//! returns a [`ClassifierStep`] telling the async shell what to do:
//! hand an event to the consumer, arm the create-disambiguation timer, or
//! nothing at all.
//!
//! The shell (`classify::runtime::ClassifierRuntime`) owns channels, the
//! timer and shutdown. This module has no Tokio types and performs no IO
//! apart from the stat call made when a pending create resolves, which goes
//! through the injected [`FileSystem`].

use tracing::{debug, error, trace, warn};

use crate::classify::buffer::LookbackBuffer;
use crate::classify::noise::NoiseFilter;
use crate::event::{ChangeKind, FileWatcherEvent};
use crate::fs::FileSystem;
use crate::source::{RawNotification, RawOps};
use crate::types::MissingCreatePolicy;

/// Outcome of feeding a single raw notification to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierStep {
    /// Hand this event to the consumer.
    Emit(FileWatcherEvent),
    /// A bare create is buffered; (re)start the disambiguation timer.
    ArmCreateTimer,
    /// Nothing to do.
    Idle,
}

/// Which rule matched the current buffer contents.
///
/// Variants are listed in precedence order; [`decide`] returns the first
/// one whose condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    RenameFolder,
    RenameFile,
    EditFile,
    RapidCreateDelete,
    DeleteFolder,
    DeleteFile,
    PendingCreate,
    BareRemove,
    Unclassified,
}

/// Evaluate the buffer against the classification rules.
///
/// Two-slot rules (renames, edits, rapid create/delete) are checked before
/// the single-slot delete rules, because a RENAME|REMOVE preceded by a
/// CREATE is a folder rename, not a folder delete.
pub fn decide(buf: &LookbackBuffer) -> Decision {
    let rename = buf.slot0_has(RawOps::RENAME);
    let remove = buf.slot0_has(RawOps::REMOVE);
    let create = buf.slot0_has(RawOps::CREATE);
    let prev_create = buf.slot1_has(RawOps::CREATE);
    let prev_remove = buf.slot1_has(RawOps::REMOVE);

    if rename && remove && prev_create {
        Decision::RenameFolder
    } else if rename && prev_create {
        Decision::RenameFile
    } else if create && prev_remove {
        Decision::EditFile
    } else if remove && prev_create {
        Decision::RapidCreateDelete
    } else if rename && remove {
        Decision::DeleteFolder
    } else if rename {
        Decision::DeleteFile
    } else if create {
        Decision::PendingCreate
    } else if remove {
        Decision::BareRemove
    } else {
        Decision::Unclassified
    }
}

/// Buffering classifier turning raw notifications into semantic events.
#[derive(Debug)]
pub struct EventClassifier {
    buffer: LookbackBuffer,
    only_create_pending: bool,
    noise: NoiseFilter,
    missing_on_create: MissingCreatePolicy,
}

impl EventClassifier {
    pub fn new(noise: NoiseFilter, missing_on_create: MissingCreatePolicy) -> Self {
        Self {
            buffer: LookbackBuffer::new(),
            only_create_pending: false,
            noise,
            missing_on_create,
        }
    }

    /// Current buffer contents (for tests and diagnostics).
    pub fn buffer(&self) -> &LookbackBuffer {
        &self.buffer
    }

    /// Whether a bare create is waiting on the disambiguation timer.
    pub fn create_pending(&self) -> bool {
        self.only_create_pending
    }

    /// Feed one raw notification.
    pub fn classify(&mut self, raw: RawNotification) -> ClassifierStep {
        if self.noise.is_noise(&raw.path) {
            trace!(path = ?raw.path, "ignoring noise path");
            return ClassifierStep::Idle;
        }

        if raw.has(RawOps::CHMOD) {
            return ClassifierStep::Emit(FileWatcherEvent::new(ChangeKind::Chmod, raw.path));
        }

        self.buffer.push(raw);

        if !self.buffer.slot0_has(RawOps::CREATE) {
            self.only_create_pending = false;
        }

        let decision = decide(&self.buffer);
        trace!(?decision, buffer = ?self.buffer, "classified buffer");

        match decision {
            Decision::RenameFolder => self.emit_rename(ChangeKind::RenameFolder),
            Decision::RenameFile => self.emit_rename(ChangeKind::RenameFile),
            Decision::EditFile => self.emit_slot0(ChangeKind::EditFile),
            Decision::RapidCreateDelete => {
                self.log_rapid_create_delete();
                self.buffer.clear();
                ClassifierStep::Idle
            }
            Decision::DeleteFolder => self.emit_slot0(ChangeKind::DeleteFolder),
            Decision::DeleteFile => self.emit_slot0(ChangeKind::DeleteFile),
            Decision::PendingCreate => {
                self.only_create_pending = true;
                ClassifierStep::ArmCreateTimer
            }
            Decision::BareRemove => ClassifierStep::Idle,
            Decision::Unclassified => {
                if let Some(raw) = self.buffer.slot0() {
                    warn!("unknown event {raw}");
                }
                ClassifierStep::Idle
            }
        }
    }

    /// Resolve a buffered bare create once the disambiguation delay has
    /// elapsed. A fire after the create was superseded is a no-op.
    pub fn resolve_pending_create(&mut self, fs: &dyn FileSystem) -> Option<FileWatcherEvent> {
        if !self.only_create_pending {
            trace!("stale create timer fire ignored");
            return None;
        }
        self.only_create_pending = false;

        let Some(raw) = self.buffer.slot0().cloned() else {
            self.buffer.clear();
            return None;
        };
        self.buffer.clear();

        let stat = fs.stat(&raw.path);
        if !stat.exists {
            error!("file {:?} is missing", raw.path);
            if self.missing_on_create == MissingCreatePolicy::Suppress {
                return None;
            }
        }

        let kind = if stat.is_dir {
            ChangeKind::CreateFolder
        } else {
            ChangeKind::CreateFile
        };
        Some(FileWatcherEvent::new(kind, raw.path))
    }

    fn emit_rename(&mut self, kind: ChangeKind) -> ClassifierStep {
        let step = match (self.buffer.slot1(), self.buffer.slot0()) {
            (Some(new), Some(old)) => ClassifierStep::Emit(FileWatcherEvent::renamed(
                kind,
                new.path.clone(),
                old.path.clone(),
            )),
            _ => ClassifierStep::Idle,
        };
        self.buffer.clear();
        step
    }

    fn emit_slot0(&mut self, kind: ChangeKind) -> ClassifierStep {
        let step = match self.buffer.slot0() {
            Some(raw) => ClassifierStep::Emit(FileWatcherEvent::new(kind, raw.path.clone())),
            None => ClassifierStep::Idle,
        };
        self.buffer.clear();
        step
    }

    fn log_rapid_create_delete(&self) {
        if let (Some(removed), Some(created)) = (self.buffer.slot0(), self.buffer.slot1()) {
            if removed.path == created.path {
                debug!("file {:?} was rapidly created and then removed", removed.path);
            } else {
                warn!(
                    removed = %removed,
                    created = %created,
                    "unexpected series of events"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn raw(path: &str, ops: RawOps) -> RawNotification {
        RawNotification::new(path, ops)
    }

    fn classifier() -> EventClassifier {
        EventClassifier::new(NoiseFilter::default(), MissingCreatePolicy::Emit)
    }

    fn emitted(step: ClassifierStep) -> FileWatcherEvent {
        match step {
            ClassifierStep::Emit(ev) => ev,
            other => panic!("expected an emitted event, got {other:?}"),
        }
    }

    #[test]
    fn create_then_rename_is_a_file_rename() {
        let mut c = classifier();
        assert_eq!(
            c.classify(raw("/w/new.txt", RawOps::CREATE)),
            ClassifierStep::ArmCreateTimer
        );
        let ev = emitted(c.classify(raw("/w/old.txt", RawOps::RENAME)));

        assert_eq!(ev.kind, ChangeKind::RenameFile);
        assert_eq!(ev.path.to_str(), Some("/w/new.txt"));
        assert_eq!(ev.previous_path().and_then(|p| p.to_str()), Some("/w/old.txt"));
        assert!(c.buffer().is_empty());
        assert!(!c.create_pending());
    }

    #[test]
    fn create_then_rename_remove_is_a_folder_rename() {
        let mut c = classifier();
        c.classify(raw("/w/new_dir", RawOps::CREATE));
        let ev = emitted(c.classify(raw("/w/old_dir", RawOps::RENAME | RawOps::REMOVE)));

        assert_eq!(ev.kind, ChangeKind::RenameFolder);
        assert_eq!(ev.path.to_str(), Some("/w/new_dir"));
        assert_eq!(ev.previous_path().and_then(|p| p.to_str()), Some("/w/old_dir"));
    }

    #[test]
    fn remove_then_create_is_an_edit() {
        let mut c = classifier();
        assert_eq!(c.classify(raw("/w/a.txt", RawOps::REMOVE)), ClassifierStep::Idle);
        let ev = emitted(c.classify(raw("/w/a.txt", RawOps::CREATE)));

        assert_eq!(ev, FileWatcherEvent::new(ChangeKind::EditFile, "/w/a.txt"));
        assert!(c.buffer().is_empty());
    }

    #[test]
    fn create_then_remove_is_suppressed() {
        let mut c = classifier();
        c.classify(raw("/w/a.txt", RawOps::CREATE));
        assert!(c.create_pending());

        assert_eq!(c.classify(raw("/w/a.txt", RawOps::REMOVE)), ClassifierStep::Idle);
        assert!(c.buffer().is_empty());
        assert!(!c.create_pending());
    }

    #[test]
    fn lone_renames_are_deletes() {
        let mut c = classifier();
        let ev = emitted(c.classify(raw("/w/dir", RawOps::RENAME | RawOps::REMOVE)));
        assert_eq!(ev.kind, ChangeKind::DeleteFolder);

        let ev = emitted(c.classify(raw("/w/a.txt", RawOps::RENAME)));
        assert_eq!(ev.kind, ChangeKind::DeleteFile);
        assert_eq!(ev.path.to_str(), Some("/w/a.txt"));
    }

    #[test]
    fn chmod_bypasses_the_buffer() {
        let mut c = classifier();
        c.classify(raw("/w/new.txt", RawOps::CREATE));
        let before = c.buffer().clone();

        let ev = emitted(c.classify(raw("/w/other", RawOps::CHMOD | RawOps::WRITE)));
        assert_eq!(ev, FileWatcherEvent::new(ChangeKind::Chmod, "/w/other"));
        assert_eq!(c.buffer(), &before);
        assert!(c.create_pending());
    }

    #[test]
    fn noise_paths_are_dropped() {
        let mut c = classifier();
        assert_eq!(c.classify(raw("/w/.DS_Store", RawOps::CHMOD)), ClassifierStep::Idle);
        assert_eq!(c.classify(raw("/w/.DS_Store", RawOps::CREATE)), ClassifierStep::Idle);
        assert!(c.buffer().is_empty());
    }

    #[test]
    fn write_alone_is_unclassified() {
        let mut c = classifier();
        assert_eq!(c.classify(raw("/w/a.txt", RawOps::WRITE)), ClassifierStep::Idle);
        assert_eq!(decide(c.buffer()), Decision::Unclassified);
    }

    #[test]
    fn pending_create_resolves_by_stat() {
        let fs = MockFileSystem::new();
        fs.add_dir("/w/dir");
        fs.add_file("/w/a.txt", "a");

        let mut c = classifier();
        c.classify(raw("/w/dir", RawOps::CREATE));
        let ev = c.resolve_pending_create(&fs).unwrap();
        assert_eq!(ev, FileWatcherEvent::new(ChangeKind::CreateFolder, "/w/dir"));
        assert!(c.buffer().is_empty());

        c.classify(raw("/w/a.txt", RawOps::CREATE));
        let ev = c.resolve_pending_create(&fs).unwrap();
        assert_eq!(ev.kind, ChangeKind::CreateFile);

        // Second fire for the same create is stale.
        assert!(c.resolve_pending_create(&fs).is_none());
    }

    #[test]
    fn superseded_create_makes_timer_fire_a_noop() {
        let fs = MockFileSystem::new();
        let mut c = classifier();
        c.classify(raw("/w/a.txt", RawOps::CREATE));
        c.classify(raw("/w/b.txt", RawOps::WRITE));

        assert!(!c.create_pending());
        assert!(c.resolve_pending_create(&fs).is_none());
    }

    #[test]
    fn missing_path_policy() {
        let fs = MockFileSystem::new();

        let mut c = classifier();
        c.classify(raw("/w/gone", RawOps::CREATE));
        let ev = c.resolve_pending_create(&fs).unwrap();
        assert_eq!(ev.kind, ChangeKind::CreateFile);

        let mut c = EventClassifier::new(NoiseFilter::default(), MissingCreatePolicy::Suppress);
        c.classify(raw("/w/gone", RawOps::CREATE));
        assert!(c.resolve_pending_create(&fs).is_none());
        assert!(c.buffer().is_empty());
        assert!(!c.create_pending());
    }

    #[test]
    fn precedence_prefers_two_slot_rules() {
        let mut buf = LookbackBuffer::new();
        buf.push(raw("/w/new", RawOps::CREATE));
        buf.push(raw("/w/old", RawOps::RENAME | RawOps::REMOVE));
        assert_eq!(decide(&buf), Decision::RenameFolder);

        let mut buf = LookbackBuffer::new();
        buf.push(raw("/w/a", RawOps::REMOVE));
        buf.push(raw("/w/a", RawOps::CREATE | RawOps::REMOVE));
        // slot0 CREATE with slot1 REMOVE wins over slot0 REMOVE alone.
        assert_eq!(decide(&buf), Decision::EditFile);
    }
}
