//! Scratch files and directories for I/O tests.
//!
//! Both handles own their `tempfile` guard, so the file or directory lives
//! exactly as long as the handle.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Scratch file removed on drop.
///
/// The extension matters to this crate: it picks the compression format, so
/// most tests want [`TempFilePath::with_extension`].
pub struct TempFilePath(NamedTempFile);

impl TempFilePath {
    /// # Errors
    /// Fails if the OS refuses to create the file.
    pub fn new() -> std::io::Result<Self> {
        NamedTempFile::new().map(Self)
    }

    /// Empty scratch file whose name ends in `.{extension}`, e.g. `jsonl.gz`.
    ///
    /// # Errors
    /// Fails if the OS refuses to create the file.
    pub fn with_extension(extension: &str) -> std::io::Result<Self> {
        tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()
            .map(Self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.0.path()
    }
}

/// Scratch directory removed, content included, on drop.
///
/// Use it when a test needs a path that does not exist yet (appending to a
/// missing file, a `save` that must create its target).
pub struct TempDirPath(TempDir);

impl TempDirPath {
    /// # Errors
    /// Fails if the OS refuses to create the directory.
    pub fn new() -> std::io::Result<Self> {
        TempDir::new().map(Self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.0.path()
    }

    /// Path of `filename` inside the directory; nothing is created.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.0.path().join(filename)
    }
}

/// Plain `.jsonl` scratch file holding `records`, each followed by `\n`.
///
/// Lines are produced by `serde_json::to_writer` rather than this crate's
/// writer, so the file can serve as an independent fixture for the readers.
///
/// # Errors
/// Fails if a record does not serialize or the file cannot be written.
///
/// ```
/// use ironlines::testing::mock_jsonl_file;
/// use serde_json::json;
///
/// let temp = mock_jsonl_file(&[json!({"id": 1}), json!({"id": 2})]).unwrap();
/// let text = std::fs::read_to_string(temp.path()).unwrap();
/// assert_eq!(text, "{\"id\":1}\n{\"id\":2}\n");
/// ```
pub fn mock_jsonl_file<T: Serialize>(records: &[T]) -> std::io::Result<TempFilePath> {
    let mut bytes = Vec::new();
    for record in records {
        serde_json::to_writer(&mut bytes, record)?;
        bytes.push(b'\n');
    }
    mock_raw_file("jsonl", &bytes)
}

/// Scratch file ending in `.{extension}` holding exactly `bytes`.
///
/// # Errors
/// Fails if the file cannot be created or written.
pub fn mock_raw_file(extension: &str, bytes: &[u8]) -> std::io::Result<TempFilePath> {
    let temp = TempFilePath::with_extension(extension)?;
    std::fs::write(temp.path(), bytes)?;
    Ok(temp)
}
