//! Per-file `.sha256` sidecars in `sha256sum` text format.
//!
//! Failures are isolated per file: an unreadable source or an unwritable
//! sidecar is reported through [`SidecarOutcome`] and the batch continues.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::hashing::sha256_file;
use crate::paths::{display_name, is_sidecar, sidecar_path};
use crate::pool::run_unordered;

/// Result of processing one candidate file.
#[derive(Debug)]
pub enum SidecarOutcome {
    Written {
        source: PathBuf,
        sidecar: PathBuf,
        digest: String,
    },
    ReadFailed {
        source: PathBuf,
        error: io::Error,
    },
    WriteFailed {
        source: PathBuf,
        sidecar: PathBuf,
        error: io::Error,
    },
}

impl SidecarOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, SidecarOutcome::Written { .. })
    }

    pub fn source(&self) -> &Path {
        match self {
            SidecarOutcome::Written { source, .. }
            | SidecarOutcome::ReadFailed { source, .. }
            | SidecarOutcome::WriteFailed { source, .. } => source,
        }
    }
}

/// Counts gathered while draining a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SidecarSummary {
    pub written: usize,
    pub failed: usize,
}

/// One `sha256sum`-compatible line: digest, two spaces, file name.
pub fn sidecar_line(digest: &str, file_name: &str) -> String {
    format!("{digest}  {file_name}\n")
}

/// Enumerate the files that need a sidecar, sorted by path.
///
/// Existing `.sha256` files are never candidates. Without `recursive`
/// only direct children that are files are returned; with it every
/// non-directory entry of the tree is, and unreadable subdirectories are
/// skipped with a warning.
pub fn collect_candidates(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if recursive {
        for entry in WalkDir::new(dir).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let file_type = entry.file_type();
            if file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir()) {
                continue;
            }
            if !is_sidecar(entry.path()) {
                files.push(entry.into_path());
            }
        }
    } else {
        let entries =
            fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("read directory {}", dir.display()))?
                .path();
            if path.is_file() && !is_sidecar(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Hash `source` and write `<source>.sha256` next to it.
pub fn write_sidecar(source: &Path) -> SidecarOutcome {
    let digest = match sha256_file(source) {
        Ok(digest) => digest,
        Err(error) => {
            return SidecarOutcome::ReadFailed {
                source: source.to_path_buf(),
                error,
            }
        }
    };
    let sidecar = sidecar_path(source);
    let line = sidecar_line(&digest, &display_name(source));
    match fs::write(&sidecar, line) {
        Ok(()) => {
            debug!(source = %source.display(), %digest, "sidecar written");
            SidecarOutcome::Written {
                source: source.to_path_buf(),
                sidecar,
                digest,
            }
        }
        Err(error) => SidecarOutcome::WriteFailed {
            source: source.to_path_buf(),
            sidecar,
            error,
        },
    }
}

/// Write sidecars for `files` on a pool of `workers` threads.
///
/// `on_start` runs on the worker before each file; `on_outcome` runs on the
/// calling thread in completion order.
pub fn write_sidecars(
    files: &[PathBuf],
    workers: usize,
    on_start: impl Fn(&Path) + Sync,
    mut on_outcome: impl FnMut(&SidecarOutcome),
) -> SidecarSummary {
    let mut summary = SidecarSummary::default();
    run_unordered(
        files,
        workers,
        |path| {
            on_start(path);
            write_sidecar(path)
        },
        |outcome| {
            if outcome.is_written() {
                summary.written += 1;
            } else {
                summary.failed += 1;
            }
            on_outcome(&outcome);
        },
    );
    summary
}
