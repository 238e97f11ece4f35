// src/config/model.rs

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::classify::{NoiseFilter, DEFAULT_CREATE_DELAY_MS, DEFAULT_IGNORE};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::MissingCreatePolicy;
use crate::watch::WatcherOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watcher]
/// paths = ["src", "README.md"]
/// create_delay_ms = 125
/// ignore = ["**/.DS_Store"]
/// missing_on_create = "emit"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watcher: WatcherSection,
}

/// `[watcher]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatcherSection {
    /// Paths to watch when none are given on the command line.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Delay before a bare create is resolved into CreateFile/CreateFolder.
    #[serde(default = "default_create_delay_ms")]
    pub create_delay_ms: u64,

    /// Glob patterns for paths that are never classified.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// `"emit"` (default) or `"suppress"`.
    #[serde(default)]
    pub missing_on_create: MissingCreatePolicy,
}

fn default_create_delay_ms() -> u64 {
    DEFAULT_CREATE_DELAY_MS
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            create_delay_ms: default_create_delay_ms(),
            ignore: default_ignore(),
            missing_on_create: MissingCreatePolicy::default(),
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub watcher: WatcherSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watcher: WatcherSection) -> Self {
        Self { watcher }
    }

    /// Turn the `[watcher]` section into constructor options.
    pub fn watcher_options(&self, fs: Arc<dyn FileSystem>) -> Result<WatcherOptions> {
        Ok(WatcherOptions::default()
            .with_fs(fs)
            .with_create_delay(Duration::from_millis(self.watcher.create_delay_ms))
            .with_noise_filter(NoiseFilter::from_globs(&self.watcher.ignore)?)
            .with_missing_on_create(self.watcher.missing_on_create))
    }
}
