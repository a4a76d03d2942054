//! Path helpers for digest keys and sidecar naming.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension appended to every sidecar file.
pub const SIDECAR_EXTENSION: &str = "sha256";

/// Rewrite `\` separators as `/` so keys are stable across platforms.
pub fn normalize_separators(value: &str) -> String {
    value.replace('\\', "/")
}

/// Build the digest key for `path` relative to `root`.
pub fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| anyhow!("{} is not under {}", path.display(), root.display()))?;
    Ok(normalize_separators(&rel.to_string_lossy()))
}

/// Final path component as text, falling back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `<path>.sha256`, keeping the original extension intact.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

/// True when the file name already carries the sidecar extension.
pub fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .ends_with(&format!(".{SIDECAR_EXTENSION}"))
        })
        .unwrap_or(false)
}
