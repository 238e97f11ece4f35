// src/lib.rs

pub mod classify;
pub mod cli;
pub mod config;
pub mod errors;
pub mod event;
pub mod fs;
pub mod logging;
pub mod source;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::classify::NoiseFilter;
use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, ConfigFile};
use crate::fs::{FileSystem, RealFileSystem};

pub use crate::event::{ChangeKind, FileWatcherEvent};
pub use crate::watch::{FileWatcher, WatchStreams, WatcherOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the `notify`-backed `FileWatcher`
/// - printing classified events to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cfg = load_config(fs.as_ref(), args.config.as_deref())?;
    let options = resolve_options(&cfg, &args, Arc::clone(&fs))?;
    let paths = resolve_paths(&cfg, &args);

    if args.dry_run {
        print_dry_run(&options, &paths);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (watcher, mut streams) = FileWatcher::init(shutdown_rx, options)?;

    for path in &paths {
        let abs = fs.canonicalize(Path::new(path))?;
        watcher.add(&abs)?;
    }
    info!(paths = ?watcher.watched_paths(), "semwatch started");

    // Ctrl-C → graceful shutdown.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(());
    });

    loop {
        tokio::select! {
            Some(event) = streams.events.recv() => println!("{event}"),
            Some(err) = streams.errors.recv() => warn!(error = %err, "watch error"),
            else => break,
        }
    }

    info!("semwatch exiting");
    Ok(())
}

/// Use `--config` if given, otherwise `Semwatch.toml` when present, otherwise
/// built-in defaults.
fn load_config(fs: &dyn FileSystem, explicit: Option<&str>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return Ok(load_and_validate(fs, path)?);
    }

    let default_path = default_config_path();
    if fs.is_file(&default_path) {
        debug!(path = ?default_path, "loading default config");
        return Ok(load_and_validate(fs, &default_path)?);
    }

    Ok(ConfigFile::default())
}

fn resolve_options(
    cfg: &ConfigFile,
    args: &CliArgs,
    fs: Arc<dyn FileSystem>,
) -> Result<WatcherOptions> {
    let mut options = cfg.watcher_options(fs)?;

    if !args.ignore.is_empty() {
        let mut ignore = cfg.watcher.ignore.clone();
        ignore.extend(args.ignore.iter().cloned());
        options.noise = NoiseFilter::from_globs(&ignore)?;
    }

    if let Some(ms) = args.create_delay_ms {
        if ms == 0 {
            bail!("--create-delay-ms must be >= 1");
        }
        options.create_delay = Duration::from_millis(ms);
    }

    Ok(options)
}

fn resolve_paths(cfg: &ConfigFile, args: &CliArgs) -> Vec<String> {
    if !args.paths.is_empty() {
        args.paths.clone()
    } else if !cfg.watcher.paths.is_empty() {
        cfg.watcher.paths.clone()
    } else {
        vec![".".to_string()]
    }
}

fn print_dry_run(options: &WatcherOptions, paths: &[String]) {
    println!("semwatch dry-run");
    println!("  create_delay = {:?}", options.create_delay);
    println!("  ignore = {:?}", options.noise);
    println!("  missing_on_create = {:?}", options.missing_on_create);
    println!();
    println!("paths ({}):", paths.len());
    for path in paths {
        println!("  - {path}");
    }

    debug!("dry-run complete (nothing watched)");
}
