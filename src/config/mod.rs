// src/config/mod.rs

//! Configuration loading and validation for semwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file through the `FileSystem` abstraction (`loader.rs`).
//! - Validate delays, ignore globs and paths (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile, WatcherSection};
pub use validate::validate_config;
