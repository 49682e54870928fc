use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Creates `path` and its parents when missing. An existing directory is left
/// untouched.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).with_context(|| format!("create directory '{}'", path.display()))
}
