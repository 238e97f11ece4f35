// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatcherError};
use crate::fs::FileSystem;

/// Load a configuration file and return the raw, unvalidated `RawConfigFile`.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path).map_err(WatcherError::Other)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and run validation.
///
/// This is the recommended entry point for the rest of the application:
/// it reads TOML, applies defaults (via `serde`) and checks the delay, the
/// ignore globs and the path list.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(fs, &path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Config file looked up in the current directory when `--config` is not
/// given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Semwatch.toml")
}
