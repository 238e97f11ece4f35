// src/watch/options.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::Dispatch;

use crate::classify::{NoiseFilter, DEFAULT_CREATE_DELAY_MS};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::MissingCreatePolicy;

/// Everything a [`FileWatcher`](super::FileWatcher) needs injected at
/// construction time.
#[derive(Clone)]
pub struct WatcherOptions {
    /// Filesystem used for stat calls in `add` and create resolution.
    pub fs: Arc<dyn FileSystem>,
    /// How long a bare create waits for a follow-up before resolving.
    pub create_delay: Duration,
    /// Paths dropped before classification.
    pub noise: NoiseFilter,
    pub missing_on_create: MissingCreatePolicy,
    /// Where diagnostics go. `None` uses whatever dispatcher is current when
    /// the watcher is created.
    pub logger: Option<Dispatch>,
}

impl fmt::Debug for WatcherOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherOptions")
            .field("fs", &self.fs)
            .field("create_delay", &self.create_delay)
            .field("noise", &self.noise)
            .field("missing_on_create", &self.missing_on_create)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            create_delay: Duration::from_millis(DEFAULT_CREATE_DELAY_MS),
            noise: NoiseFilter::default(),
            missing_on_create: MissingCreatePolicy::default(),
            logger: None,
        }
    }
}

impl WatcherOptions {
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_noise_filter(mut self, noise: NoiseFilter) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_missing_on_create(mut self, policy: MissingCreatePolicy) -> Self {
        self.missing_on_create = policy;
        self
    }

    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }
}
