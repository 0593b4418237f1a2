// src/fs/ops.rs

//! General filesystem helpers.
//!
//! Failures are logged at `error` level and returned; "not found" and
//! "already exists" conditions keep their `io::ErrorKind` so callers can match
//! on them.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{FoundationError, Result};

/// Directory names skipped by [`replace_text_in_files`].
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".ruff_cache",
    ".pytest_cache",
    "__pycache__",
    ".venv",
    "target",
];

/// Number of leading bytes inspected when deciding whether a file is binary.
const BINARY_SNIFF_LEN: usize = 1024;

fn not_found(what: &str, path: &Path) -> FoundationError {
    FoundationError::IoError(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{what} does not exist: {}", path.display()),
    ))
}

fn walk_error(err: walkdir::Error) -> FoundationError {
    FoundationError::IoError(io::Error::from(err))
}

fn in_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| SKIPPED_DIRS.contains(&n))
}

fn already_exists(what: &str, path: &Path) -> FoundationError {
    FoundationError::IoError(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{what} already exists: {}", path.display()),
    ))
}

/// Create a directory and all missing parents.
pub fn ensure_directory_exists(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path.as_ref())?;
    Ok(())
}

/// Remove a directory and everything in it.
///
/// With `ignore_errors`, failures (including a missing directory) are
/// swallowed.
pub fn remove_directory(path: impl AsRef<Path>, ignore_errors: bool) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(_) if ignore_errors => Ok(()),
        Err(e) => {
            error!(path = ?path, error = %e, "error removing directory");
            Err(e.into())
        }
    }
}

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file(source: impl AsRef<Path>, destination: impl AsRef<Path>, overwrite: bool) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    if !source.is_file() {
        return Err(not_found("source file", source));
    }
    if destination.exists() && !overwrite {
        return Err(already_exists("destination file", destination));
    }

    let copy = || -> io::Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        Ok(())
    };

    copy().map_err(|e| {
        error!(source = ?source, destination = ?destination, error = %e, "error copying file");
        e.into()
    })
}

/// Recursively copy a directory, merging into an existing destination.
///
/// `ignore_patterns` are globs matched against each entry's file name (not its
/// full path); matching files and directories are skipped.
pub fn copy_directory(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    ignore_patterns: &[String],
) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    if !source.is_dir() {
        return Err(not_found("source directory", source));
    }

    let ignore = build_name_globset(ignore_patterns)?;
    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let skip = e.depth() > 0 && ignore.is_match(Path::new(e.file_name()));
            if skip {
                debug!(path = ?e.path(), "skipping ignored entry");
            }
            !skip
        });

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = destination.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| {
                error!(source = ?entry.path(), destination = ?target, error = %e, "error copying file");
                e
            })?;
        }
    }

    Ok(())
}

/// Copy a file or a directory, dispatching on what `source` is.
///
/// `overwrite` applies to files; directories always merge.
pub fn copy_file_or_directory(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    overwrite: bool,
    ignore_patterns: &[String],
) -> Result<()> {
    let source = source.as_ref();
    if !source.exists() {
        return Err(not_found("source", source));
    }
    if source.is_file() {
        copy_file(source, destination, overwrite)
    } else {
        copy_directory(source, destination, ignore_patterns)
    }
}

pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let meta = fs::metadata(path).map_err(|e| {
        error!(path = ?path, error = %e, "error getting file size");
        e
    })?;
    Ok(meta.len())
}

/// Total size in bytes of all files below `path`.
pub fn directory_size(path: impl AsRef<Path>) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(path.as_ref()) {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(walk_error)?.len();
        }
    }
    Ok(total)
}

/// Create a fresh directory.
///
/// If it already exists: with `overwrite` it is removed and recreated,
/// otherwise an `AlreadyExists` error is returned.
pub fn create_directory_safely(path: impl AsRef<Path>, overwrite: bool) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.exists() {
        if !overwrite {
            return Err(already_exists("directory", path));
        }
        remove_directory(path, false)?;
    }
    ensure_directory_exists(path)?;
    Ok(path.to_path_buf())
}

/// Rename `parent/old_name` to `parent/new_name`.
///
/// Tries an atomic rename first and falls back to copy + remove (e.g. across
/// devices). A partially copied destination is cleaned up on failure.
pub fn rename_subdirectory(
    parent: impl AsRef<Path>,
    old_name: &str,
    new_name: &str,
    overwrite: bool,
) -> Result<()> {
    let parent = parent.as_ref();
    let old_path = parent.join(old_name);
    let new_path = parent.join(new_name);

    if !old_path.exists() {
        return Err(not_found("source directory", &old_path));
    }
    if new_path.exists() {
        if !overwrite {
            return Err(already_exists("destination directory", &new_path));
        }
        remove_directory(&new_path, false)?;
    }

    if let Err(rename_err) = fs::rename(&old_path, &new_path) {
        debug!(error = %rename_err, "rename failed; falling back to copy + remove");
        let fallback = copy_directory(&old_path, &new_path, &[])
            .and_then(|()| remove_directory(&old_path, false));
        if let Err(err) = fallback {
            if new_path.exists() {
                let _ = remove_directory(&new_path, true);
            }
            error!(from = ?old_path, to = ?new_path, error = %err, "error renaming directory");
            return Err(err);
        }
    }

    Ok(())
}

/// Replace `old_text` with `new_text` in the given files and, recursively,
/// in the files below the given directories.
///
/// Binary files (a NUL byte among the first bytes), non UTF-8 files and
/// anything below [`SKIPPED_DIRS`] are left alone. With `extensions`, only
/// files whose extension matches (case-insensitively, without the dot) are
/// touched. Returns the number of files rewritten.
pub fn replace_text_in_files<P: AsRef<Path>>(
    paths: &[P],
    old_text: &str,
    new_text: &str,
    extensions: Option<&[&str]>,
) -> Result<usize> {
    let mut changed = 0;

    for root in paths {
        let root = root.as_ref();
        if !root.exists() {
            return Err(not_found("path", root));
        }

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !in_skipped_dir(e));
        for entry in walker {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() || !has_allowed_extension(entry.path(), extensions) {
                continue;
            }
            if replace_in_file(entry.path(), old_text, new_text)? {
                changed += 1;
            }
        }
    }

    Ok(changed)
}

fn has_allowed_extension(path: &Path, extensions: Option<&[&str]>) -> bool {
    let Some(allowed) = extensions else {
        return true;
    };
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    allowed
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

fn replace_in_file(path: &Path, old_text: &str, new_text: &str) -> Result<bool> {
    let mut head = Vec::with_capacity(BINARY_SNIFF_LEN);
    fs::File::open(path)?
        .take(BINARY_SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    if head.contains(&0) {
        return Ok(false);
    }

    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(path = ?path, "skipping non UTF-8 file");
            return Ok(false);
        }
        Err(e) => {
            error!(path = ?path, error = %e, "error reading file");
            return Err(e.into());
        }
    };

    if !contents.contains(old_text) {
        return Ok(false);
    }

    fs::write(path, contents.replace(old_text, new_text)).map_err(|e| {
        error!(path = ?path, error = %e, "error updating text in file");
        e
    })?;
    Ok(true)
}

/// Find files below `directory` whose *file name* matches a glob `pattern`.
///
/// Results are sorted for stable output.
pub fn find_files_by_pattern(
    directory: impl AsRef<Path>,
    pattern: &str,
    recursive: bool,
    case_sensitive: bool,
) -> Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| FoundationError::ConfigError(format!("invalid glob pattern '{pattern}': {e}")))?
        .compile_matcher();

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();
    for entry in WalkDir::new(directory.as_ref()).min_depth(1).max_depth(max_depth) {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_dir() && matcher.is_match(Path::new(entry.file_name())) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Look for `target_name` in `start` and each of its ancestors.
///
/// A file as `start` begins the search in its parent. The walk stops after
/// `boundary` (inclusive) or at the filesystem root when there is none;
/// a `start` outside `boundary` finds nothing.
pub fn find_path_up_to_boundary(
    start: impl AsRef<Path>,
    target_name: &str,
    boundary: Option<&Path>,
) -> Result<Option<PathBuf>> {
    let mut current = fs::canonicalize(start.as_ref())?;
    if current.is_file() {
        current.pop();
    }
    let boundary = boundary.map(fs::canonicalize).transpose()?;

    for dir in current.ancestors() {
        if let Some(limit) = &boundary {
            if !dir.starts_with(limit) {
                break;
            }
        }
        let candidate = dir.join(target_name);
        if candidate.exists() {
            debug!(path = ?candidate, "found {target_name}");
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

/// Whether the regular file at `path` has zero length.
pub fn is_file_empty(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(FoundationError::IoError(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a regular file: {}", path.display()),
        )));
    }
    Ok(meta.len() == 0)
}

/// Overwrite an existing file with `new_content`.
///
/// Nothing is written when the content already matches, or when `condition`
/// rejects the current content. Returns whether the file was rewritten.
pub fn update_file_content(
    path: impl AsRef<Path>,
    new_content: &str,
    condition: Option<&dyn Fn(&str) -> bool>,
) -> Result<bool> {
    let path = path.as_ref();
    let current = fs::read_to_string(path).map_err(|e| {
        error!(path = ?path, error = %e, "error reading file");
        e
    })?;

    if current == new_content {
        debug!(path = ?path, "content already up to date");
        return Ok(false);
    }
    if condition.is_some_and(|accept| !accept(&current)) {
        return Ok(false);
    }

    let mut file = fs::OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(new_content.as_bytes())?;
    file.sync_all()?;
    info!(path = ?path, "file updated");
    Ok(true)
}

fn build_name_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob: Glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| FoundationError::ConfigError(format!("invalid glob pattern '{pat}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| FoundationError::ConfigError(format!("building glob set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter_ignores_case_and_dots() {
        let exts: &[&str] = &[".RS", "toml"];
        assert!(has_allowed_extension(Path::new("a/b.rs"), Some(exts)));
        assert!(has_allowed_extension(Path::new("Cargo.TOML"), Some(exts)));
        assert!(!has_allowed_extension(Path::new("README"), Some(exts)));
        assert!(has_allowed_extension(Path::new("README"), None));
    }
}
