//! Path helpers for layer discovery.

use crate::ConfigError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Canonicalize `path`, keeping it as-is when it does not exist yet.
pub(super) fn normalize_path(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(err.into()),
    }
}

/// Key used to merge a file only once when two layers resolve to it.
pub(super) fn unique_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Closest ancestor of `cwd` (inclusive) containing one of `markers`.
pub(super) fn find_project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}
