// src/fs/mod.rs

//! Filesystem access.
//!
//! - [`FileSystem`] is the narrow interface the change processor needs
//!   (existence checks for lock files, reads for content hashing, path
//!   canonicalisation). [`RealFileSystem`] backs it with `std::fs`;
//!   [`mock::MockFileSystem`] keeps everything in memory for tests.
//! - [`ops`] holds general-purpose helpers (copying, sizing, searching,
//!   text replacement) that work directly on the real filesystem.

use std::fmt::Debug;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;
pub mod ops;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }
}
