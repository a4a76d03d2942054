//! Directory walk that maps relative paths to SHA-256 digests.
//!
//! Any unreadable entry aborts the whole walk; callers only ever see a
//! complete map or an error.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::hashing::sha256_file;
use crate::paths::relative_key;

/// Output file written into the working directory by the map tool.
pub const DIGEST_MAP_FILE: &str = "sha256.json";

/// Normalized path (or archive entry name) to lowercase hex digest.
///
/// Keys serialize in sorted order, so two maps over the same content
/// always render to the same bytes.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct DigestMap {
    entries: BTreeMap<String, String>,
}

impl DigestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a digest; a repeated key keeps the latest value.
    pub fn insert(&mut self, key: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(key.into(), digest.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize digest map")
    }

    /// Pretty JSON with every non-ASCII character written as a `\uXXXX`
    /// escape (UTF-16 surrogate pairs above the BMP).
    pub fn to_json_pretty_ascii(&self) -> Result<String> {
        Ok(escape_non_ascii(&self.to_json_pretty()?))
    }

    /// Serialize as ASCII-only JSON and write the map to `path`.
    pub fn write_ascii_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty_ascii()?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))
    }
}

// Non-ASCII only ever appears inside JSON strings, so escaping is safe anywhere.
fn escape_non_ascii(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units) {
            escaped.push_str(&format!("\\u{unit:04x}"));
        }
    }
    escaped
}

/// Hash every file under `root`, keyed by its `/`-separated relative path.
///
/// Directories are skipped, including symlinks that resolve to one; every
/// other entry is opened and hashed.
pub fn build_digest_map(root: &Path) -> Result<DigestMap> {
    if !root.is_dir() {
        return Err(anyhow!("directory not found: {}", root.display()));
    }
    let mut map = DigestMap::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        let file_type = entry.file_type();
        if file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir()) {
            continue;
        }
        let key = relative_key(root, entry.path())?;
        let digest = sha256_file(entry.path())
            .with_context(|| format!("hash {}", entry.path().display()))?;
        debug!(path = %key, %digest, "hashed file");
        map.insert(key, digest);
    }
    Ok(map)
}
