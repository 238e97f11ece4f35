// src/watch/registry.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

/// Set of paths currently registered with the raw source.
///
/// Backed by a `DashMap` keyed and valued by the path, so it can be shared
/// between callers without an outer lock. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct WatchRegistry {
    paths: Arc<DashMap<PathBuf, PathBuf>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<PathBuf> {
        self.paths.get(path).map(|entry| entry.value().clone())
    }

    pub fn set(&self, path: PathBuf) {
        self.paths.insert(path.clone(), path);
    }

    pub fn remove(&self, path: &Path) -> Option<PathBuf> {
        self.paths.remove(path).map(|(_, v)| v)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains_key(path)
    }

    /// Sorted snapshot of every registered path.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = self.paths.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
