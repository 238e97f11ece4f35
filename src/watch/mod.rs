// src/watch/mod.rs

//! Caller-facing watch API.
//!
//! This module is responsible for:
//! - tracking which paths are registered (`registry`),
//! - the options injected at construction (`options`),
//! - the [`FileWatcher`] facade that ties the raw source, the registry and
//!   the classifier loop together (`watcher`).
//!
//! It does **not** interpret raw notifications; that is `classify`'s job.

pub mod options;
pub mod registry;
pub mod watcher;

pub use crate::classify::WatchStreams;
pub use options::WatcherOptions;
pub use registry::WatchRegistry;
pub use watcher::FileWatcher;
