#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// Write `contents` to a temporary `.toml` file that lives as long as the
/// returned handle.
pub fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    write!(file, "{contents}").unwrap();
    file
}
