//! The line codec: one JSON document per `\n`-terminated line.
//!
//! [`JsonlReader`] pulls one line at a time from any [`BufRead`] and decodes
//! it on demand, so memory stays bounded by the longest line no matter how
//! large the file is. [`JsonlWriter`] frames each serialized record with a
//! single trailing `\n`.
//!
//! Both work on arbitrary byte streams; the file-level operations in
//! [`crate::io::jsonl`] only add transport selection around them.

use crate::error::{Error, Result, location};
use crate::io::encode::{EncodeFlags, encode_into};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{BufRead, Write};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use tracing::trace;

/// Lazy, forward-only decoder of JSON Lines.
///
/// Iteration yields `Result<T>`; the first error (I/O or decode) is yielded
/// once, after which the underlying reader is dropped and the iterator is
/// exhausted. Dropping the iterator early releases the reader as well.
///
/// A final line without a trailing `\n` is still a record. A trailing `\r` is
/// stripped along with the `\n`.
pub struct JsonlReader<R, T> {
    reader: Option<R>,
    buf: Vec<u8>,
    line: u64,
    skip_blank_lines: bool,
    label: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: DeserializeOwned> JsonlReader<R, T> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            buf: Vec::new(),
            line: 0,
            skip_blank_lines: false,
            label: None,
            _marker: PhantomData,
        }
    }

    /// Skip empty and whitespace-only lines instead of failing on them.
    #[must_use]
    pub fn skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }

    /// Name used for the source in error messages, usually the file path.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of lines consumed so far (1-based number of the last line read).
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line
    }

    /// Whether the underlying reader is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Release the underlying reader now; further calls to `next` return `None`.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            trace!(lines = self.line, "JSONL reader closed early");
        }
    }

    fn fail(&mut self, err: Error) -> Option<Result<T>> {
        self.reader = None;
        Some(Err(err))
    }
}

fn trim_line_end(mut bytes: &[u8]) -> &[u8] {
    if let [rest @ .., b'\n'] = bytes {
        bytes = rest;
        if let [rest @ .., b'\r'] = bytes {
            bytes = rest;
        }
    }
    bytes
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonlReader<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let reader = self.reader.as_mut()?;
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    trace!(lines = self.line, "JSONL reader exhausted");
                    self.reader = None;
                    return None;
                }
                Ok(_) => self.line += 1,
                Err(e) => {
                    let context = format!(
                        "read line {}{}",
                        self.line + 1,
                        location(self.label.as_deref())
                    );
                    return self.fail(Error::io(context, e));
                }
            }

            let bytes = trim_line_end(&self.buf);
            if self.skip_blank_lines && bytes.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return match serde_json::from_slice(bytes) {
                Ok(record) => Some(Ok(record)),
                Err(source) => {
                    let err = Error::Decode {
                        line: self.line,
                        location: location(self.label.as_deref()),
                        source,
                    };
                    self.fail(err)
                }
            };
        }
    }
}

impl<R: BufRead, T: DeserializeOwned> FusedIterator for JsonlReader<R, T> {}

/// Encoder of JSON Lines onto any [`Write`].
///
/// Each record is serialized into an internal line buffer first and then
/// written together with its `\n`, so a record that cannot be encoded never
/// leaves partial bytes in the output. Buffering and finalization of the
/// underlying writer stay with the caller.
pub struct JsonlWriter<W: Write> {
    writer: W,
    buf: Vec<u8>,
    flags: EncodeFlags,
    written: u64,
    label: Option<String>,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_flags(writer, EncodeFlags::NONE)
    }

    pub fn with_flags(writer: W, flags: EncodeFlags) -> Self {
        Self {
            writer,
            buf: Vec::with_capacity(256),
            flags,
            written: 0,
            label: None,
        }
    }

    /// Name used for the sink in error messages, usually the file path.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Records written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write a bare `\n`, used to terminate a previous unterminated line.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the underlying writer fails.
    pub fn write_newline(&mut self) -> Result<()> {
        self.writer.write_all(b"\n").map_err(|e| {
            Error::io(
                format!("write newline{}", location(self.label.as_deref())),
                e,
            )
        })
    }

    /// Encode one record and write it as a line.
    ///
    /// # Errors
    /// [`Error::Encode`] if the record is not representable as JSON,
    /// [`Error::Io`] if the underlying writer fails.
    pub fn write_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        self.emit(record, None::<fn(&T) -> Option<Value>>)
    }

    /// Like [`write_record`](Self::write_record), but a record the encoder
    /// rejects is passed to `fallback` and its result encoded instead.
    ///
    /// The fallback runs at most once per record; returning `None`, or a value
    /// that fails to encode as well, yields [`Error::Encode`] with the
    /// encoder's error.
    pub fn write_record_with<T, F>(&mut self, record: &T, fallback: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> Option<Value>,
    {
        self.emit(record, Some(fallback))
    }

    /// Write every record of `records`, in order. Returns how many were written.
    ///
    /// # Errors
    /// Stops at the first failing record; records before it stay written.
    pub fn write_records<I>(&mut self, records: I) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        let start = self.written;
        for record in records {
            self.write_record(&record)?;
        }
        Ok(self.written - start)
    }

    /// [`write_records`](Self::write_records) with a fallback conversion.
    ///
    /// # Errors
    /// As for [`write_record_with`](Self::write_record_with).
    pub fn write_records_with<I, F>(&mut self, records: I, fallback: F) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Serialize,
        F: Fn(&I::Item) -> Option<Value>,
    {
        let start = self.written;
        for record in records {
            self.write_record_with(&record, &fallback)?;
        }
        Ok(self.written - start)
    }

    fn emit<T, F>(&mut self, record: &T, fallback: Option<F>) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> Option<Value>,
    {
        let index = self.written;
        if let Err(source) = encode_into(&mut self.buf, record, self.flags) {
            let Some(value) = fallback.and_then(|f| f(record)) else {
                return Err(self.encode_error(index, source));
            };
            trace!(index, "record encoded through fallback");
            if let Err(source) = encode_into(&mut self.buf, &value, self.flags) {
                return Err(self.encode_error(index, source));
            }
        }
        self.buf.push(b'\n');
        self.writer.write_all(&self.buf).map_err(|e| {
            Error::io(
                format!("write item #{index}{}", location(self.label.as_deref())),
                e,
            )
        })?;
        self.written += 1;
        Ok(())
    }

    fn encode_error(&self, index: u64, source: serde_json::Error) -> Error {
        Error::Encode {
            index,
            location: location(self.label.as_deref()),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::io::{self, Cursor};

    fn values(input: &[u8]) -> JsonlReader<Cursor<Vec<u8>>, Value> {
        JsonlReader::new(Cursor::new(input.to_vec()))
    }

    #[test]
    fn reads_one_record_per_line() {
        let got: Vec<Value> = values(b"1\n\"two\"\n[3]\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(got, vec![json!(1), json!("two"), json!([3])]);
    }

    #[test]
    fn final_line_without_newline_is_a_record() {
        let got: Vec<Value> = values(b"{\"a\":1}\n{\"b\":2}").collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn crlf_line_endings() {
        let got: Vec<Value> = values(b"1\r\n2\r\n").collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![json!(1), json!(2)]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(values(b"").count(), 0);
    }

    #[test]
    fn blank_line_is_an_error_unless_skipped() {
        let mut strict = values(b"1\n\n2\n");
        assert_eq!(strict.next().unwrap().unwrap(), json!(1));
        let err = strict.next().unwrap().unwrap_err();
        assert_eq!(err.line(), Some(2));

        let lenient: Vec<Value> = values(b"1\n\n  \n2\n")
            .skip_blank_lines(true)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lenient, vec![json!(1), json!(2)]);
    }

    #[test]
    fn decode_error_ends_the_sequence() {
        let mut it = values(b"1\n{bad\n3\n").with_label("mem");
        assert_eq!(it.next().unwrap().unwrap(), json!(1));
        let err = it.next().unwrap().unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("line 2 in mem"));
        assert!(!it.is_open());
        assert!(it.next().is_none());
    }

    #[test]
    fn close_releases_reader() {
        let mut it = values(b"1\n2\n");
        assert_eq!(it.next().unwrap().unwrap(), json!(1));
        it.close();
        assert!(it.next().is_none());
        assert_eq!(it.line_number(), 1);
    }

    #[test]
    fn io_errors_surface_as_io() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }
        }
        let mut it: JsonlReader<_, Value> = JsonlReader::new(io::BufReader::new(Broken));
        assert!(it.next().unwrap().unwrap_err().is_io());
        assert!(it.next().is_none());
    }

    #[test]
    fn typed_records() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Rec {
            id: u32,
        }
        let got: Vec<Rec> = JsonlReader::new(Cursor::new(b"{\"id\":1}\n{\"id\":2}\n".to_vec()))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(got, vec![Rec { id: 1 }, Rec { id: 2 }]);
    }

    #[test]
    fn writes_framed_records() {
        let mut w = JsonlWriter::new(Vec::new());
        let n = w
            .write_records([json!({"hello": "world"}), json!([1.1, 2.2, 3.3]), json!(42)])
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(
            w.into_inner(),
            b"{\"hello\":\"world\"}\n[1.1,2.2,3.3]\n42\n".to_vec()
        );
    }

    #[test]
    fn failed_record_leaves_no_partial_bytes() {
        let mut bad = BTreeMap::new();
        bad.insert((1, 2), "x");
        let mut w = JsonlWriter::new(Vec::new());
        w.write_record(&json!(1)).unwrap();
        let err = w.write_record(&bad).unwrap_err();
        assert!(err.is_encode());
        assert_eq!(w.written(), 1);
        assert_eq!(w.into_inner(), b"1\n".to_vec());
    }

    #[test]
    fn fallback_converts_rejected_records() {
        let mut pairs = BTreeMap::new();
        pairs.insert((1, 2), "x");
        let mut w = JsonlWriter::new(Vec::new());
        w.write_record_with(&pairs, |m| {
            Some(Value::Array(
                m.iter()
                    .map(|((a, b), v)| json!([[a, b], v]))
                    .collect(),
            ))
        })
        .unwrap();
        assert_eq!(w.into_inner(), b"[[[1,2],\"x\"]]\n".to_vec());
    }

    #[test]
    fn fallback_is_not_consulted_for_valid_records() {
        let mut w = JsonlWriter::new(Vec::new());
        w.write_record_with(&json!("ok"), |_| -> Option<Value> {
            panic!("fallback must not run")
        })
        .unwrap();
        assert_eq!(w.into_inner(), b"\"ok\"\n".to_vec());
    }

    #[test]
    fn fallback_returning_none_is_an_encode_error() {
        let mut bad = BTreeMap::new();
        bad.insert((0, 0), 0);
        let mut w = JsonlWriter::new(Vec::new());
        let err = w.write_record_with(&bad, |_| None).unwrap_err();
        assert!(err.is_encode());
        assert!(w.into_inner().is_empty());
    }
}
