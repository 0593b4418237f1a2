// src/fs/mock.rs

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::FileSystem;

/// In-memory filesystem.
///
/// Paths are used verbatim (no normalisation); directories exist implicitly
/// as ancestors of stored files. Clones share the same storage, so a test can
/// keep one handle while the processor owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        // A panicking test thread must not hide the contents from others.
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or overwrite a file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.files()
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Remove a file, returning whether it existed.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.files().remove(path.as_ref()).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let content = self.files().get(path).cloned();
        match content {
            Some(content) => Ok(Box::new(Cursor::new(content))),
            None if self.is_dir(path) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let is_file = self.files().contains_key(path);
        is_file || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files().contains_key(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Tests use absolute paths, so they are already canonical.
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_exist_implicitly() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/main.rs", b"fn main() {}".to_vec());

        assert!(fs.exists(Path::new("/proj/src")));
        assert!(!fs.is_file(Path::new("/proj/src")));
        assert!(fs.is_file(Path::new("/proj/src/main.rs")));
        assert!(fs.open_read(Path::new("/proj/src")).is_err());
    }

    #[test]
    fn clones_share_storage() {
        let fs = MockFileSystem::new();
        let other = fs.clone();
        fs.add_file("/a.txt", "a");
        assert!(other.exists(Path::new("/a.txt")));
        assert!(other.remove_file("/a.txt"));
        assert!(!fs.exists(Path::new("/a.txt")));
    }
}
