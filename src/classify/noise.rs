// src/classify/noise.rs

//! Filtering of paths that should never reach classification.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// Default ignore list: macOS Finder metadata.
pub const DEFAULT_IGNORE: &[&str] = &["**/.DS_Store"];

/// Decides whether a raw notification path is noise.
#[derive(Clone)]
pub enum NoiseFilter {
    /// Drop paths matching any of these globs.
    Globs { patterns: Vec<String>, set: GlobSet },
    /// Drop paths for which the predicate returns true.
    Predicate(Arc<dyn Fn(&Path) -> bool + Send + Sync>),
    /// Keep everything.
    None,
}

impl fmt::Debug for NoiseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseFilter::Globs { patterns, .. } => {
                f.debug_tuple("Globs").field(patterns).finish()
            }
            NoiseFilter::Predicate(_) => f.write_str("Predicate(..)"),
            NoiseFilter::None => f.write_str("None"),
        }
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        // The default patterns are known-good.
        match NoiseFilter::from_globs(DEFAULT_IGNORE) {
            Ok(filter) => filter,
            Err(_) => NoiseFilter::None,
        }
    }
}

impl NoiseFilter {
    pub fn from_globs<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pat in patterns {
            builder.add(Glob::new(pat.as_ref())?);
        }
        Ok(NoiseFilter::Globs {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            set: builder.build()?,
        })
    }

    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        NoiseFilter::Predicate(Arc::new(predicate))
    }

    pub fn is_noise(&self, path: &Path) -> bool {
        match self {
            NoiseFilter::Globs { set, .. } => set.is_match(path),
            NoiseFilter::Predicate(pred) => pred(path),
            NoiseFilter::None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ignores_ds_store_anywhere() {
        let filter = NoiseFilter::default();
        assert!(filter.is_noise(Path::new("/Users/me/project/.DS_Store")));
        assert!(filter.is_noise(Path::new("/w/deep/nested/.DS_Store")));
        assert!(!filter.is_noise(Path::new("/w/notes.txt")));
        assert!(!filter.is_noise(Path::new("/w/DS_Store.md")));
    }

    #[test]
    fn custom_globs_and_predicates() {
        let filter = NoiseFilter::from_globs(&["**/*.swp", "**/target/**"]).unwrap();
        assert!(filter.is_noise(Path::new("/w/.main.rs.swp")));
        assert!(filter.is_noise(Path::new("/w/target/debug/app")));
        assert!(!filter.is_noise(Path::new("/w/src/main.rs")));

        let filter = NoiseFilter::from_fn(|p| p.extension().is_some_and(|e| e == "tmp"));
        assert!(filter.is_noise(Path::new("/w/a.tmp")));
        assert!(!filter.is_noise(Path::new("/w/a.txt")));

        assert!(!NoiseFilter::None.is_noise(Path::new("/w/.DS_Store")));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(NoiseFilter::from_globs(&["a[b"]).is_err());
    }
}
