// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatcherError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatcherError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watcher))
    }
}

/// Check the semantic invariants serde cannot express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_delay(cfg)?;
    validate_ignore_patterns(cfg)?;
    validate_paths(cfg)?;
    Ok(())
}

fn validate_delay(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watcher.create_delay_ms == 0 {
        return Err(WatcherError::ConfigError(
            "[watcher].create_delay_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_ignore_patterns(cfg: &RawConfigFile) -> Result<()> {
    for pattern in &cfg.watcher.ignore {
        if let Err(err) = Glob::new(pattern) {
            return Err(WatcherError::ConfigError(format!(
                "[watcher].ignore contains invalid glob '{}': {}",
                pattern, err
            )));
        }
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watcher.paths.iter().any(|p| p.trim().is_empty()) {
        return Err(WatcherError::ConfigError(
            "[watcher].paths must not contain empty entries".to_string(),
        ));
    }
    Ok(())
}
