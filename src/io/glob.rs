//! Input discovery.
//!
//! Daily snapshot directories are expanded with glob patterns; results are
//! sorted so that every run visits files in the same order.

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use std::path::{Path, PathBuf};

/// Expand a glob pattern into the sorted list of matching regular files.
///
/// # Errors
/// Fails on an invalid pattern or an unreadable directory entry. No match is
/// an empty list, not an error.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
    let mut result = Vec::new();
    for entry in paths {
        let path = entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// CSV inputs of a run: `input` itself when it is a file, otherwise every
/// `*.csv` file directly inside it.
///
/// # Errors
/// See [`expand_glob`].
pub fn list_csv_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let dir = Pattern::escape(&input.to_string_lossy());
    expand_glob(&format!("{dir}/*.csv"))
}
