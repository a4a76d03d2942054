//! Zip archive manifests: one digest per decompressed entry.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::digest_map::DigestMap;
use crate::hashing::sha256_reader;
use crate::paths::{display_name, normalize_separators};

/// Failure classes reported by the manifest tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestErrorKind {
    Missing,
    InvalidArchive,
    Other,
}

/// Structured error produced while building or writing a manifest.
#[derive(Debug)]
pub struct ManifestError {
    pub kind: ManifestErrorKind,
    pub message: String,
    pub details: Vec<String>,
}

impl ManifestError {
    fn missing(zip_path: &Path) -> Self {
        Self {
            kind: ManifestErrorKind::Missing,
            message: format!("Error: zip file not found at '{}'", zip_path.display()),
            details: Vec::new(),
        }
    }

    fn from_zip(zip_path: &Path, err: ZipError) -> Self {
        let invalid = match &err {
            ZipError::InvalidArchive(_) => true,
            ZipError::Io(io_err) => io_err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        };
        if invalid {
            Self::invalid(zip_path, err)
        } else {
            Self::other(err)
        }
    }

    /// Corrupt entry data (bad CRC, broken compressed stream, truncation)
    /// means the archive itself is invalid.
    fn from_entry_read(zip_path: &Path, err: io::Error) -> Self {
        let corrupt = matches!(
            err.kind(),
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
        ) || err.to_string().contains("Invalid checksum");
        if corrupt {
            Self::invalid(zip_path, err)
        } else {
            Self::other(err)
        }
    }

    fn invalid(zip_path: &Path, err: impl fmt::Display) -> Self {
        Self {
            kind: ManifestErrorKind::InvalidArchive,
            message: format!("Error: '{}' is not a valid zip file.", zip_path.display()),
            details: vec![err.to_string()],
        }
    }

    fn other(err: impl fmt::Display) -> Self {
        Self {
            kind: ManifestErrorKind::Other,
            message: format!("An unexpected error occurred: {err}"),
            details: Vec::new(),
        }
    }
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ManifestError {}

/// A manifest written beside its archive.
#[derive(Debug)]
pub struct ManifestReport {
    pub manifest_path: PathBuf,
    pub manifest: DigestMap,
}

/// `<archive-stem>.json` in the archive's directory.
pub fn manifest_path(zip_path: &Path) -> PathBuf {
    zip_path.with_extension("json")
}

/// Hash every file entry of `zip_path` in sorted name order.
///
/// `on_entry` is called with each manifest key and digest as soon as the
/// entry has been hashed.
pub fn hash_archive(
    zip_path: &Path,
    mut on_entry: impl FnMut(&str, &str),
) -> Result<DigestMap, ManifestError> {
    if !zip_path.exists() {
        return Err(ManifestError::missing(zip_path));
    }
    let file = File::open(zip_path).map_err(ManifestError::other)?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ManifestError::from_zip(zip_path, err))?;

    // Only a trailing `/` marks a directory; `\`-terminated names are files.
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    names.sort();

    let mut manifest = DigestMap::new();
    for name in names {
        let entry = archive
            .by_name(&name)
            .map_err(|err| ManifestError::from_zip(zip_path, err))?;
        let digest =
            sha256_reader(entry).map_err(|err| ManifestError::from_entry_read(zip_path, err))?;
        let key = normalize_separators(&name);
        debug!(entry = %key, %digest, "hashed archive entry");
        on_entry(&key, &digest);
        manifest.insert(key, digest);
    }
    Ok(manifest)
}

/// Hash `zip_path` and write its manifest; nothing is written on failure.
pub fn generate_manifest(
    zip_path: &Path,
    on_entry: impl FnMut(&str, &str),
) -> Result<ManifestReport, ManifestError> {
    let manifest = hash_archive(zip_path, on_entry)?;
    let manifest_path = manifest_path(zip_path);
    manifest
        .write_ascii_json(&manifest_path)
        .map_err(|err| ManifestError::other(format!("{err:#}")))?;
    debug!(
        archive = %display_name(zip_path),
        entries = manifest.len(),
        "manifest written"
    );
    Ok(ManifestReport {
        manifest_path,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::sha256_hex;
    use std::fs;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        write_zip_with(path, CompressionMethod::Deflated, entries);
    }

    fn write_zip_with(path: &Path, method: CompressionMethod, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("create zip");
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<'_, ()> = FileOptions::default().compression_method(method);
        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).expect("add dir");
            } else {
                zip.start_file(*name, options).expect("start file");
                zip.write_all(content.as_bytes()).expect("write entry");
            }
        }
        zip.finish().expect("finish zip");
    }

    #[test]
    fn hashes_decompressed_entry_content() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("bundle.zip");
        write_zip(&zip_path, &[("docs/", ""), ("docs/readme.txt", "x")]);

        let report = generate_manifest(&zip_path, |_, _| {}).expect("generate manifest");
        assert_eq!(report.manifest_path, temp_dir.path().join("bundle.json"));
        assert_eq!(report.manifest.len(), 1);
        assert_eq!(
            report.manifest.get("docs/readme.txt"),
            Some("2d711642b726b04401627ca9fbac32f5c8530fb1903cc4db02258717921a4881")
        );
    }

    #[test]
    fn entries_are_visited_in_sorted_order() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("order.zip");
        write_zip(&zip_path, &[("b.txt", "b"), ("a/z.txt", "z"), ("a.txt", "a")]);

        let mut seen = Vec::new();
        hash_archive(&zip_path, |key, _| seen.push(key.to_string())).expect("hash archive");
        assert_eq!(seen, vec!["a.txt", "a/z.txt", "b.txt"]);
    }

    #[test]
    fn backslash_entry_names_become_forward_slash_keys() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("windows.zip");
        write_zip(
            &zip_path,
            &[("docs\\a.txt", "a"), ("c.txt", "c"), ("docs/b.txt", "b")],
        );

        let report = generate_manifest(&zip_path, |_, _| {}).expect("generate manifest");
        let keys: Vec<&str> = report.manifest.keys().collect();
        assert_eq!(keys, vec!["c.txt", "docs/a.txt", "docs/b.txt"]);
        assert_eq!(report.manifest.get("docs/a.txt"), Some(sha256_hex(b"a").as_str()));

        let json = fs::read_to_string(&report.manifest_path).expect("read manifest");
        let a = json.find("\"docs/a.txt\"").expect("a key");
        let b = json.find("\"docs/b.txt\"").expect("b key");
        assert!(a < b);
    }

    #[test]
    fn trailing_backslash_entry_is_a_file() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("odd.zip");
        write_zip(&zip_path, &[("dir/", ""), ("foo\\", "x")]);

        let manifest = hash_archive(&zip_path, |_, _| {}).expect("hash archive");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("foo/"), Some(sha256_hex(b"x").as_str()));
    }

    #[test]
    fn bzip2_entries_are_hashed() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("bz.zip");
        write_zip_with(&zip_path, CompressionMethod::Bzip2, &[("a.txt", "x")]);

        let manifest = hash_archive(&zip_path, |_, _| {}).expect("hash archive");
        assert_eq!(
            manifest.get("a.txt"),
            Some("2d711642b726b04401627ca9fbac32f5c8530fb1903cc4db02258717921a4881")
        );
    }

    #[test]
    fn corrupted_entry_content_is_an_invalid_archive() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("crc.zip");
        write_zip_with(&zip_path, CompressionMethod::Stored, &[("a.txt", "hello world")]);

        let mut bytes = fs::read(&zip_path).expect("read zip");
        let offset = bytes
            .windows(b"hello world".len())
            .position(|window| window == b"hello world")
            .expect("stored content");
        bytes[offset] ^= 0x01;
        fs::write(&zip_path, bytes).expect("rewrite zip");

        let err = generate_manifest(&zip_path, |_, _| {}).unwrap_err();
        assert_eq!(err.kind, ManifestErrorKind::InvalidArchive);
        assert!(err.message.contains("not a valid zip"));
        assert!(!manifest_path(&zip_path).exists());
    }

    #[test]
    fn manifest_file_escapes_non_ascii_names() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("voices.zip");
        write_zip(&zip_path, &[("音频.bin", "x")]);

        let report = generate_manifest(&zip_path, |_, _| {}).expect("generate manifest");
        let json = fs::read_to_string(&report.manifest_path).expect("read manifest");
        assert!(json.contains("\\u97f3\\u9891.bin"));
        assert!(json.is_ascii());
    }

    #[test]
    fn missing_archive_is_classified() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let err = hash_archive(&temp_dir.path().join("absent.zip"), |_, _| {}).unwrap_err();
        assert_eq!(err.kind, ManifestErrorKind::Missing);
        assert!(err.message.contains("not found"));
    }

    #[test]
    fn non_zip_is_classified_and_writes_nothing() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let zip_path = temp_dir.path().join("plain.zip");
        fs::write(&zip_path, "this is plain text and certainly not a zip archive\n")
            .expect("write plain file");

        let err = generate_manifest(&zip_path, |_, _| {}).unwrap_err();
        assert_eq!(err.kind, ManifestErrorKind::InvalidArchive);
        assert!(err.message.contains("not a valid zip"));
        assert!(!manifest_path(&zip_path).exists());
    }

    #[test]
    fn manifest_path_replaces_extension() {
        assert_eq!(
            manifest_path(Path::new("assets/voices.zip")),
            PathBuf::from("assets/voices.json")
        );
        assert_eq!(manifest_path(Path::new("bundle")), PathBuf::from("bundle.json"));
    }
}
