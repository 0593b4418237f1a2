// src/watch/filter.rs

//! Path and kind filtering for raw change events.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::ObserverConfiguration;
use crate::fs::FileSystem;
use crate::types::ChangeKind;

/// Why an event did not make it through the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// The path is not below any watched root.
    OutsideRoots,
    KindNotObserved,
    /// The event is about the processing lock file itself.
    LockFile,
    /// A processing lock file is present in a watched root.
    LockHeld,
    NotIncluded,
    Excluded,
    /// Created and deleted again within one debounce window.
    Transient,
    /// Content hash matches the last one seen.
    ContentUnchanged,
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterReason::OutsideRoots => "outside watched roots",
            FilterReason::KindNotObserved => "change kind not observed",
            FilterReason::LockFile => "processing lock file",
            FilterReason::LockHeld => "processing lock held",
            FilterReason::NotIncluded => "not matched by include patterns",
            FilterReason::Excluded => "matched by exclude patterns",
            FilterReason::Transient => "created and deleted within debounce window",
            FilterReason::ContentUnchanged => "content unchanged",
        };
        f.write_str(s)
    }
}

/// Compiled include/exclude/kind rules for one observer.
///
/// Patterns are matched against paths relative to the watched root the event
/// came from, with forward slashes (e.g. `"src/main.rs"`).
#[derive(Clone)]
pub struct ChangeFilter {
    roots: Vec<PathBuf>,
    kinds: BTreeSet<ChangeKind>,
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    lock_file: Option<String>,
}

impl fmt::Debug for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFilter")
            .field("roots", &self.roots)
            .field("kinds", &self.kinds)
            .field("lock_file", &self.lock_file)
            .finish_non_exhaustive()
    }
}

impl ChangeFilter {
    pub fn from_config(config: &ObserverConfiguration, fs: &dyn FileSystem) -> Result<Self> {
        let roots = config
            .paths()
            .iter()
            .map(|root| fs.canonicalize(root).unwrap_or_else(|_| root.clone()))
            .collect();

        let include_set = optional_globset(config.include_patterns())
            .context("building include globset")?;
        let exclude_set = optional_globset(config.exclude_patterns())
            .context("building exclude globset")?;

        Ok(Self {
            roots,
            kinds: config.kinds().clone(),
            include_set,
            exclude_set,
            lock_file: config.processing_lock_file().map(str::to_string),
        })
    }

    /// Canonicalised watch roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn lock_file(&self) -> Option<&str> {
        self.lock_file.as_deref()
    }

    /// Relative path of `path` under the first root containing it.
    ///
    /// A root itself is not below any root.
    pub fn relativize(&self, path: &Path) -> Option<String> {
        self.roots
            .iter()
            .find_map(|root| relative_str(root, path))
            .filter(|rel| !rel.is_empty())
    }

    /// Check the static rules (kind, lock file name, include, exclude).
    pub fn check(&self, rel_path: &str, kind: ChangeKind) -> Result<(), FilterReason> {
        if !self.kinds.contains(&kind) {
            return Err(FilterReason::KindNotObserved);
        }
        if self.is_lock_file(rel_path) {
            return Err(FilterReason::LockFile);
        }
        if let Some(include) = &self.include_set {
            if !include.is_match(rel_path) {
                return Err(FilterReason::NotIncluded);
            }
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return Err(FilterReason::Excluded);
            }
        }
        Ok(())
    }

    fn is_lock_file(&self, rel_path: &str) -> bool {
        match &self.lock_file {
            Some(lock) => rel_path == lock || rel_path.rsplit('/').next() == Some(lock.as_str()),
            None => false,
        }
    }

    /// Whether the lock file currently exists in any watched root.
    pub fn lock_held(&self, fs: &dyn FileSystem) -> bool {
        match &self.lock_file {
            Some(lock) => self.roots.iter().any(|root| fs.exists(&root.join(lock))),
            None => false,
        }
    }
}

fn optional_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(Some(builder.build()?))
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// A direct `strip_prefix` is tried first. If that fails (symlinked temp dirs,
/// `/private/var` on macOS) both sides are canonicalised and compared again;
/// this second attempt only works for paths that still exist.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
