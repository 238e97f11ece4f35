// src/source/mod.rs

//! Raw filesystem notification sources.
//!
//! A source turns OS-level watch callbacks into a stream of
//! [`RawNotification`]s (a path plus a set of [`RawOps`] bits) and a stream
//! of raw errors. The classifier never talks to the OS directly; it only
//! consumes these two streams.
//!
//! - [`NotifySource`] is the production implementation on top of `notify`.
//! - Tests provide their own [`RawEventSource`] that records calls and lets
//!   them inject notifications by hand.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::errors::{Result, WatcherError};

pub mod notify_source;
pub mod translate;

pub use notify_source::NotifySource;
pub use translate::{translate_event, EventTranslator, PAIRING_WINDOW};

/// Set of raw operation bits attached to a notification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawOps(u8);

impl RawOps {
    pub const CREATE: RawOps = RawOps(1 << 0);
    pub const WRITE: RawOps = RawOps(1 << 1);
    pub const REMOVE: RawOps = RawOps(1 << 2);
    pub const RENAME: RawOps = RawOps(1 << 3);
    pub const CHMOD: RawOps = RawOps(1 << 4);

    const NAMES: [(RawOps, &'static str); 5] = [
        (RawOps::CREATE, "CREATE"),
        (RawOps::WRITE, "WRITE"),
        (RawOps::REMOVE, "REMOVE"),
        (RawOps::RENAME, "RENAME"),
        (RawOps::CHMOD, "CHMOD"),
    ];

    pub const fn empty() -> Self {
        RawOps(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `op` is set. Asking about the empty set is
    /// always false.
    pub const fn has(self, op: RawOps) -> bool {
        op.0 != 0 && self.0 & op.0 == op.0
    }
}

impl BitOr for RawOps {
    type Output = RawOps;

    fn bitor(self, rhs: RawOps) -> RawOps {
        RawOps(self.0 | rhs.0)
    }
}

impl BitOrAssign for RawOps {
    fn bitor_assign(&mut self, rhs: RawOps) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for RawOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (op, name) in RawOps::NAMES {
            if self.has(op) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RawOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawOps({self})")
    }
}

/// A single low-level notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    pub path: PathBuf,
    pub ops: RawOps,
}

impl RawNotification {
    pub fn new(path: impl Into<PathBuf>, ops: RawOps) -> Self {
        Self {
            path: path.into(),
            ops,
        }
    }

    pub fn has(&self, op: RawOps) -> bool {
        self.ops.has(op)
    }
}

impl fmt::Display for RawNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.path, self.ops)
    }
}

/// The two output streams of a raw source.
#[derive(Debug)]
pub struct RawStreams {
    pub notifications: mpsc::UnboundedReceiver<RawNotification>,
    pub errors: mpsc::UnboundedReceiver<WatcherError>,
}

/// Trait abstracting the OS-level watch primitive.
///
/// Production code uses [`NotifySource`]; tests can provide an
/// implementation that records registrations and never touches the OS.
pub trait RawEventSource: Send + 'static {
    /// Start delivering notifications for `path` (non-recursive).
    fn watch(&mut self, path: &Path) -> Result<()>;

    /// Stop delivering notifications for `path`.
    fn unwatch(&mut self, path: &Path) -> Result<()>;

    /// Release the underlying watch handle. Whether a second call is an
    /// error is up to the implementation.
    fn close(&mut self) -> Result<()>;
}
