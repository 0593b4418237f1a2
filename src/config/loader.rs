// src/config/loader.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a config file without semantic checks.
///
/// Unknown change kinds and backends already fail here, as TOML errors. Read
/// failures keep their `io::ErrorKind` and name the file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        io::Error::new(e.kind(), format!("reading config {}: {e}", path.display()))
    })?;

    debug!(path = ?path, bytes = contents.len(), "config file read");
    Ok(toml::from_str(&contents)?)
}

/// Read a config file and validate it into a [`ConfigFile`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}

/// `Foundation.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Foundation.toml")
}
