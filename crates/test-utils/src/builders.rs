#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use semwatch::classify::NoiseFilter;
use semwatch::config::{ConfigFile, RawConfigFile, WatcherSection};
use semwatch::fs::FileSystem;
use semwatch::source::{RawNotification, RawOps};
use semwatch::types::MissingCreatePolicy;
use semwatch::WatcherOptions;

pub fn create(path: &str) -> RawNotification {
    RawNotification::new(path, RawOps::CREATE)
}

pub fn remove(path: &str) -> RawNotification {
    RawNotification::new(path, RawOps::REMOVE)
}

pub fn rename(path: &str) -> RawNotification {
    RawNotification::new(path, RawOps::RENAME)
}

/// RENAME|REMOVE, the pattern a moved or deleted folder produces.
pub fn remove_rename(path: &str) -> RawNotification {
    RawNotification::new(path, RawOps::REMOVE | RawOps::RENAME)
}

pub fn write(path: &str) -> RawNotification {
    RawNotification::new(path, RawOps::WRITE)
}

pub fn chmod(path: &str) -> RawNotification {
    RawNotification::new(path, RawOps::CHMOD)
}

/// Builder for `WatcherOptions` to simplify test setup.
pub struct OptionsBuilder {
    options: WatcherOptions,
}

impl OptionsBuilder {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            options: WatcherOptions::default().with_fs(fs),
        }
    }

    pub fn create_delay_ms(mut self, ms: u64) -> Self {
        self.options.create_delay = Duration::from_millis(ms);
        self
    }

    pub fn ignore(mut self, patterns: &[&str]) -> Self {
        self.options.noise =
            NoiseFilter::from_globs(patterns).expect("invalid ignore pattern in test");
        self
    }

    pub fn suppress_missing_creates(mut self) -> Self {
        self.options.missing_on_create = MissingCreatePolicy::Suppress;
        self
    }

    pub fn logger(mut self, dispatch: tracing::Dispatch) -> Self {
        self.options.logger = Some(dispatch);
        self
    }

    pub fn build(self) -> WatcherOptions {
        self.options
    }
}

/// Builder for `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watcher: WatcherSection::default(),
            },
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.config.watcher.paths.push(path.to_string());
        self
    }

    pub fn create_delay_ms(mut self, ms: u64) -> Self {
        self.config.watcher.create_delay_ms = ms;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watcher.ignore.push(pattern.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn p(path: &str) -> PathBuf {
    PathBuf::from(path)
}
