// src/watch/hash.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the blake3 hash of a single file, as lowercase hex.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash per path.
///
/// Used to drop modify notifications for files whose bytes did not change
/// (editors that touch files on save, `touch`, metadata-only updates).
#[derive(Debug, Default)]
pub struct ContentCache {
    hashes: HashMap<PathBuf, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current hash for `path`.
    ///
    /// Returns `true` if the content differs from the previous record (or
    /// there was none).
    pub fn update(&mut self, path: &Path, hash: String) -> bool {
        match self.hashes.get(path) {
            Some(prev) if *prev == hash => {
                debug!(path = ?path, "content hash unchanged");
                false
            }
            _ => {
                self.hashes.insert(path.to_path_buf(), hash);
                true
            }
        }
    }

    pub fn forget(&mut self, path: &Path) {
        self.hashes.remove(path);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
