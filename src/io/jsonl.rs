//! File-level JSON Lines operations.
//!
//! This module provides:
//! - **Lazy reads**: [`stream`] returns a [`JsonlStream`] that decodes one line per pull
//! - **Eager reads**: [`load`] drains a stream into a `Vec<T>`
//! - **Truncating writes**: [`save`] / [`save_with`]
//! - **Appends**: [`append`] / [`append_with`] / [`append_record`]
//!
//! # Notes
//! - Compression is picked per call from the options or the file extension
//!   (see [`crate::io::format`]); reads also recognize compressed content in
//!   files with an unrecognized extension.
//! - Writers are always finalized, even when a record fails to encode, so a
//!   compressed file is a valid container holding every record before the
//!   failure. Nothing is rolled back.
//! - Parent directories are not created.
//! - No locking: concurrent writers to one path may interleave.

use crate::error::{Error, Result};
use crate::io::compression::{ByteReader, OpenMode, open_reader, open_source, open_writer};
use crate::io::lines::{JsonlReader, JsonlWriter};
use crate::options::{AppendOptions, ReadOptions, WriteOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Lazy sequence of records read from a file; owns the open transport.
pub type JsonlStream<T> = JsonlReader<ByteReader, T>;

impl<T: DeserializeOwned> JsonlReader<ByteReader, T> {
    /// Stream records from an already-open source such as a [`File`](std::fs::File).
    ///
    /// There is no path to take an extension from, so the format is
    /// `opts.format` if set and is otherwise sniffed from the first bytes.
    ///
    /// # Errors
    /// [`Error::Io`] if the head of `source` cannot be read,
    /// [`Error::UnsupportedFormat`] if its compression has no transport.
    pub fn from_reader<R>(source: R, opts: &ReadOptions) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (_, reader) = open_source(source, opts)?;
        Ok(JsonlReader::new(reader).skip_blank_lines(opts.skip_blank_lines))
    }
}

/// Open a (possibly compressed) JSON Lines file as a lazy record iterator.
///
/// Nothing is decoded until the iterator is pulled. The file stays open until
/// the iterator is exhausted, fails, is [closed](JsonlReader::close) or is dropped.
///
/// # Errors
/// [`Error::Io`] if the file cannot be opened, [`Error::UnsupportedFormat`] if
/// its compression has no transport. Per-line failures surface as `Err` items.
///
/// # Examples
/// ```no_run
/// use ironlines::{ReadOptions, stream};
/// use serde_json::Value;
///
/// for record in stream::<Value>("events.jsonl.gz", &ReadOptions::default())? {
///     println!("{}", record?);
/// }
/// # Ok::<(), ironlines::Error>(())
/// ```
pub fn stream<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    opts: &ReadOptions,
) -> Result<JsonlStream<T>> {
    let path = path.as_ref();
    let (_, reader) = open_reader(path, opts)?;
    Ok(JsonlReader::new(reader)
        .skip_blank_lines(opts.skip_blank_lines)
        .with_label(path.display().to_string()))
}

/// Read a whole JSON Lines file into memory.
///
/// Equivalent to collecting [`stream`].
///
/// # Errors
/// As for [`stream`], plus the first per-line error.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Vec<T>> {
    let path = path.as_ref();
    let records = stream::<T>(path, opts)?.collect::<Result<Vec<T>>>()?;
    debug!(path = %path.display(), records = records.len(), "loaded JSONL file");
    Ok(records)
}

/// Write `records` to `path`, one compact JSON document per line, replacing
/// any existing file.
///
/// Returns the number of records written.
///
/// # Errors
/// [`Error::UnsupportedFormat`] (checked before the file is touched),
/// [`Error::Io`], or [`Error::Encode`] for a record that is not representable
/// as JSON.
pub fn save<I>(path: impl AsRef<Path>, records: I, opts: &WriteOptions) -> Result<u64>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    write_file(
        path.as_ref(),
        OpenMode::Truncate,
        false,
        records,
        None::<fn(&I::Item) -> Option<Value>>,
        opts,
    )
}

/// [`save`] with a fallback conversion for records the encoder rejects.
///
/// # Errors
/// As for [`save`]; a record is an [`Error::Encode`] only if `default`
/// returns `None` for it or its result fails to encode too.
pub fn save_with<I, F>(
    path: impl AsRef<Path>,
    records: I,
    default: F,
    opts: &WriteOptions,
) -> Result<u64>
where
    I: IntoIterator,
    I::Item: Serialize,
    F: Fn(&I::Item) -> Option<Value>,
{
    write_file(
        path.as_ref(),
        OpenMode::Truncate,
        false,
        records,
        Some(default),
        opts,
    )
}

/// Append `records` to `path`, creating the file if needed.
///
/// When `opts.newline_present` is `false`, a single `\n` is written before
/// the first record to terminate the file's last line. The flag is trusted:
/// it is written even for empty or missing files, and a file that already
/// ended with `\n` gains a blank line.
///
/// For compressed formats the records are appended as a new member/frame,
/// which every reader in this crate decodes as a continuation of the file.
///
/// # Errors
/// As for [`save`].
pub fn append<I>(path: impl AsRef<Path>, records: I, opts: &AppendOptions) -> Result<u64>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    write_file(
        path.as_ref(),
        OpenMode::Append,
        !opts.newline_present,
        records,
        None::<fn(&I::Item) -> Option<Value>>,
        &opts.write,
    )
}

/// [`append`] with a fallback conversion for records the encoder rejects.
///
/// # Errors
/// As for [`save_with`].
pub fn append_with<I, F>(
    path: impl AsRef<Path>,
    records: I,
    default: F,
    opts: &AppendOptions,
) -> Result<u64>
where
    I: IntoIterator,
    I::Item: Serialize,
    F: Fn(&I::Item) -> Option<Value>,
{
    write_file(
        path.as_ref(),
        OpenMode::Append,
        !opts.newline_present,
        records,
        Some(default),
        &opts.write,
    )
}

/// Append a single record; shorthand for [`append`] with a one-element input.
///
/// # Errors
/// As for [`append`].
pub fn append_record<T>(path: impl AsRef<Path>, record: &T, opts: &AppendOptions) -> Result<()>
where
    T: Serialize + ?Sized,
{
    append(path, std::iter::once(record), opts).map(|_| ())
}

fn write_file<I, F>(
    path: &Path,
    mode: OpenMode,
    leading_newline: bool,
    records: I,
    default: Option<F>,
    opts: &WriteOptions,
) -> Result<u64>
where
    I: IntoIterator,
    I::Item: Serialize,
    F: Fn(&I::Item) -> Option<Value>,
{
    let (format, transport) = open_writer(path, mode, opts)?;
    let mut writer =
        JsonlWriter::with_flags(transport, opts.flags).with_label(path.display().to_string());

    let outcome = write_body(&mut writer, leading_newline, records, default);

    // Finalize on every path; an encode/write error takes precedence over a
    // failure to finish.
    let written = writer.written();
    let finished = writer
        .into_inner()
        .finish()
        .map_err(|e| Error::io(format!("finish {}", path.display()), e));
    outcome?;
    finished?;

    debug!(path = %path.display(), %format, ?mode, records = written, "wrote JSONL records");
    Ok(written)
}

fn write_body<W, I, F>(
    writer: &mut JsonlWriter<W>,
    leading_newline: bool,
    records: I,
    default: Option<F>,
) -> Result<u64>
where
    W: std::io::Write,
    I: IntoIterator,
    I::Item: Serialize,
    F: Fn(&I::Item) -> Option<Value>,
{
    if leading_newline {
        writer.write_newline()?;
    }
    match default {
        Some(default) => writer.write_records_with(records, default),
        None => writer.write_records(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn save_then_load() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::io("tempdir", e))?;
        let path = dir.path().join("t.jsonl");
        let records = vec![json!({"a": 1}), json!([true, null])];
        assert_eq!(save(&path, &records, &WriteOptions::default())?, 2);
        let back: Vec<Value> = load(&path, &ReadOptions::default())?;
        assert_eq!(back, records);
        Ok(())
    }

    #[test]
    fn append_record_adds_one_line() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::io("tempdir", e))?;
        let path = dir.path().join("t.jsonl");
        fs::write(&path, "\"hello world\"\n").map_err(|e| Error::io("seed", e))?;
        append_record(&path, &json!(["fizz", "buzz"]), &AppendOptions::default())?;
        let bytes = fs::read(&path).map_err(|e| Error::io("read", e))?;
        assert_eq!(bytes, b"\"hello world\"\n[\"fizz\",\"buzz\"]\n");
        Ok(())
    }

    #[test]
    fn from_reader_over_plain_bytes() -> Result<()> {
        let source = std::io::Cursor::new(b"1\n\n[2]\n".to_vec());
        let opts = ReadOptions::default().skip_blank_lines(true);
        let got = JsonlStream::<Value>::from_reader(source, &opts)?.collect::<Result<Vec<_>>>()?;
        assert_eq!(got, vec![json!(1), json!([2])]);
        Ok(())
    }

    #[test]
    fn missing_parent_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/t.jsonl");
        let err = save(&path, [1, 2], &WriteOptions::default()).unwrap_err();
        assert!(err.is_io());
    }
}
