//! Compression transports for transparent JSON Lines I/O.
//!
//! A transport turns a file (or any byte source/sink) into a buffered byte
//! stream that decompresses or compresses on the fly. The transport is picked
//! once, when the stream is opened, from the [`Format`] the resolver produced;
//! no per-read or per-write dispatch on the format happens after that.
//!
//! ## Built-in Codecs
//!
//! When enabled via feature flags, the following codecs are available:
//! - **Gzip** (`.gz`) - via `flate2` crate (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) - via `zstd` crate (feature: `compression-zstd`)
//! - **Bzip2** (`.bz2`) - via `bzip2` crate (feature: `compression-bzip2`)
//! - **Xz** (`.xz`) - via `xz2` crate (feature: `compression-xz`)
//!
//! A format whose feature is disabled fails with
//! [`Error::UnsupportedFormat`] before any file is touched.
//!
//! ## Design Decisions
//!
//! ### Concatenated streams
//! Appending to a compressed file adds a new gzip member, bzip2 stream, xz
//! stream or zstd frame after the existing ones. Readers therefore always use
//! the multi-member decoders, so an appended file reads back as one sequence.
//!
//! ### Explicit finalization
//! Compressed containers need a trailer. [`TransportWriter::finish`] writes it
//! and reports any error; dropping a writer without finishing it is a bug in
//! the caller (zstd in particular writes nothing on drop).
//!
//! ### Thread hints
//! `compression_threads` is forwarded to the zstd and xz encoders, which run
//! their own worker pools. None of the bundled decoders decode in parallel,
//! so `decompression_threads` is accepted and otherwise ignored.

use crate::error::{Error, Result};
use crate::io::format::{Format, resolve, resolve_for_read};
use crate::options::{ReadOptions, WriteOptions};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, IntoInnerError, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

/// Buffered, decompressing byte stream.
pub type ByteReader = Box<dyn BufRead + Send>;

/// How a write transport positions itself in the target file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file, discarding existing content.
    Truncate,
    /// Create the file if missing, otherwise write after its current end.
    Append,
}

fn unavailable(format: Format) -> Error {
    Error::unsupported(
        format.name(),
        format!(
            "crate built without the `{}` feature",
            format.feature().unwrap_or("default")
        ),
    )
}

/// Fail with [`Error::UnsupportedFormat`] if this build has no transport for `format`.
pub fn ensure_available(format: Format) -> Result<()> {
    if format.is_available() {
        Ok(())
    } else {
        Err(unavailable(format))
    }
}

/// Wrap a buffered source with the decoder for `format`.
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] when the codec is not compiled in, or
/// [`Error::Io`] when the decoder cannot be initialized.
pub fn wrap_reader<R>(reader: R, format: Format, threads: Option<u32>) -> Result<ByteReader>
where
    R: BufRead + Send + 'static,
{
    if let Some(n) = threads
        && format != Format::None
    {
        debug!(%format, threads = n, "decoder runs single-threaded; thread hint ignored");
    }
    let wrapped: ByteReader = match format {
        Format::None => Box::new(reader),
        #[cfg(feature = "compression-gzip")]
        Format::Gzip => Box::new(BufReader::new(flate2::bufread::MultiGzDecoder::new(reader))),
        #[cfg(feature = "compression-zstd")]
        Format::Zstd => {
            let decoder = zstd::stream::read::Decoder::with_buffer(reader)
                .map_err(|e| Error::io("initialize zstd decoder", e))?;
            Box::new(BufReader::new(decoder))
        }
        #[cfg(feature = "compression-bzip2")]
        Format::Bzip2 => Box::new(BufReader::new(bzip2::bufread::MultiBzDecoder::new(reader))),
        #[cfg(feature = "compression-xz")]
        Format::Xz => Box::new(BufReader::new(xz2::bufread::XzDecoder::new_multi_decoder(
            reader,
        ))),
        #[allow(unreachable_patterns)]
        other => return Err(unavailable(other)),
    };
    Ok(wrapped)
}

/// Open `path` for reading and wrap it with the matching decoder.
///
/// Returns the resolved format together with the stream.
///
/// # Errors
/// [`Error::Io`] if the file cannot be opened or its head cannot be read,
/// [`Error::UnsupportedFormat`] if the format has no transport in this build.
pub fn open_reader(path: &Path, opts: &ReadOptions) -> Result<(Format, ByteReader)> {
    if let Some(format) = opts.format {
        ensure_available(format)?;
    }
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    decode_source(file, Some(path), opts)
}

/// Wrap an already-open byte source with the matching decoder.
///
/// Without a path the format comes from `opts.format` or, failing that, from
/// the magic bytes at the head of `source`.
///
/// # Errors
/// As for [`open_reader`], minus the open.
pub fn open_source<R>(source: R, opts: &ReadOptions) -> Result<(Format, ByteReader)>
where
    R: Read + Send + 'static,
{
    decode_source(source, None, opts)
}

fn decode_source<R>(
    source: R,
    path: Option<&Path>,
    opts: &ReadOptions,
) -> Result<(Format, ByteReader)>
where
    R: Read + Send + 'static,
{
    let label = path.map_or_else(|| "reader".to_owned(), |p| p.display().to_string());
    let mut buffered = BufReader::new(source);
    let format = resolve_for_read(path.unwrap_or(Path::new("")), opts.format, &mut buffered)
        .map_err(|e| Error::io(format!("read {label}"), e))?;
    ensure_available(format)?;

    // A zero-byte source holds no container at all, so there is nothing to decode.
    let empty = buffered
        .fill_buf()
        .map_err(|e| Error::io(format!("read {label}"), e))?
        .is_empty();
    let transport = if empty { Format::None } else { format };
    debug!(source = %label, %format, empty, "opened JSONL reader");
    let reader = wrap_reader(buffered, transport, opts.decompression_threads)?;
    Ok((format, reader))
}

/// Open `path` for writing in `mode` and wrap it with the matching encoder.
///
/// The format is checked before the file is opened, so an unsupported format
/// never truncates an existing file. Parent directories are not created.
///
/// # Errors
/// [`Error::UnsupportedFormat`] or [`Error::Io`], as for [`open_reader`].
pub fn open_writer(
    path: &Path,
    mode: OpenMode,
    opts: &WriteOptions,
) -> Result<(Format, TransportWriter<File>)> {
    let format = resolve(path, opts.format);
    ensure_available(format)?;
    let file = match mode {
        OpenMode::Truncate => File::create(path),
        OpenMode::Append => OpenOptions::new().append(true).create(true).open(path),
    }
    .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
    debug!(path = %path.display(), %format, ?mode, "opened JSONL writer");
    let writer = TransportWriter::new(file, format, opts)
        .map_err(|e| Error::io(format!("setup compression for {}", path.display()), e))?;
    Ok((format, writer))
}

enum Sink<W: Write> {
    Plain(W),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::write::GzEncoder<W>),
    #[cfg(feature = "compression-zstd")]
    Zstd(zstd::stream::write::Encoder<'static, W>),
    #[cfg(feature = "compression-bzip2")]
    Bzip2(bzip2::write::BzEncoder<W>),
    #[cfg(feature = "compression-xz")]
    Xz(xz2::write::XzEncoder<W>),
}

impl<W: Write> Sink<W> {
    #[cfg_attr(
        not(any(feature = "compression-zstd", feature = "compression-xz")),
        allow(unused_variables)
    )]
    fn open(inner: W, format: Format, level: Option<i32>, threads: Option<u32>) -> io::Result<Self> {
        let sink = match format {
            Format::None => Sink::Plain(inner),
            #[cfg(feature = "compression-gzip")]
            Format::Gzip => {
                use flate2::Compression;
                let level = level.map_or_else(Compression::default, |l| {
                    Compression::new(l.clamp(0, 9) as u32)
                });
                Sink::Gzip(flate2::write::GzEncoder::new(inner, level))
            }
            #[cfg(feature = "compression-zstd")]
            Format::Zstd => {
                let range = zstd::compression_level_range();
                let level = level.map_or(zstd::DEFAULT_COMPRESSION_LEVEL, |l| {
                    l.clamp(*range.start(), *range.end())
                });
                let mut encoder = zstd::stream::write::Encoder::new(inner, level)?;
                if let Some(n) = threads.filter(|&n| n > 1) {
                    encoder.multithread(n)?;
                }
                Sink::Zstd(encoder)
            }
            #[cfg(feature = "compression-bzip2")]
            Format::Bzip2 => {
                use bzip2::Compression;
                let level = level.map_or_else(Compression::default, |l| {
                    Compression::new(l.clamp(1, 9) as u32)
                });
                Sink::Bzip2(bzip2::write::BzEncoder::new(inner, level))
            }
            #[cfg(feature = "compression-xz")]
            Format::Xz => {
                let preset = level.map_or(6, |l| l.clamp(0, 9) as u32);
                match threads.filter(|&n| n > 1) {
                    Some(n) => {
                        let stream = xz2::stream::MtStreamBuilder::new()
                            .threads(n)
                            .preset(preset)
                            .check(xz2::stream::Check::Crc64)
                            .encoder()?;
                        Sink::Xz(xz2::write::XzEncoder::new_stream(inner, stream))
                    }
                    None => Sink::Xz(xz2::write::XzEncoder::new(inner, preset)),
                }
            }
            #[allow(unreachable_patterns)]
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("no {other} transport in this build"),
                ));
            }
        };
        Ok(sink)
    }

    fn finish(self) -> io::Result<W> {
        match self {
            Sink::Plain(w) => Ok(w),
            #[cfg(feature = "compression-gzip")]
            Sink::Gzip(e) => e.finish(),
            #[cfg(feature = "compression-zstd")]
            Sink::Zstd(e) => e.finish(),
            #[cfg(feature = "compression-bzip2")]
            Sink::Bzip2(e) => e.finish(),
            #[cfg(feature = "compression-xz")]
            Sink::Xz(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            #[cfg(feature = "compression-gzip")]
            Sink::Gzip(e) => e.write(buf),
            #[cfg(feature = "compression-zstd")]
            Sink::Zstd(e) => e.write(buf),
            #[cfg(feature = "compression-bzip2")]
            Sink::Bzip2(e) => e.write(buf),
            #[cfg(feature = "compression-xz")]
            Sink::Xz(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            Sink::Gzip(e) => e.flush(),
            #[cfg(feature = "compression-zstd")]
            Sink::Zstd(e) => e.flush(),
            #[cfg(feature = "compression-bzip2")]
            Sink::Bzip2(e) => e.flush(),
            #[cfg(feature = "compression-xz")]
            Sink::Xz(e) => e.flush(),
        }
    }
}

/// Buffered, compressing byte sink.
///
/// Call [`finish`](Self::finish) to flush the buffer and write the
/// container trailer; the underlying writer is handed back afterwards.
pub struct TransportWriter<W: Write> {
    format: Format,
    buf: BufWriter<Sink<W>>,
}

impl<W: Write> TransportWriter<W> {
    /// Wrap `inner` with the encoder for the format in `opts` (or plain output).
    ///
    /// # Errors
    /// Fails if the encoder cannot be initialized, or with
    /// [`io::ErrorKind::Unsupported`] for codecs missing from this build.
    pub fn new(inner: W, format: Format, opts: &WriteOptions) -> io::Result<Self> {
        let sink = Sink::open(inner, format, opts.compression_level, opts.compression_threads)?;
        Ok(Self {
            format,
            buf: BufWriter::new(sink),
        })
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Flush buffered bytes, finalize the compression container and flush the
    /// underlying writer, which is handed back.
    ///
    /// # Errors
    /// Returns the first I/O error hit while flushing or finalizing.
    pub fn finish(self) -> io::Result<W> {
        let format = self.format;
        let sink = self.buf.into_inner().map_err(IntoInnerError::into_error)?;
        let mut inner = sink.finish()?;
        inner.flush()?;
        trace!(%format, "transport finished");
        Ok(inner)
    }
}

impl<W: Write> Write for TransportWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.buf.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buf.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(format: Format, opts: &WriteOptions) -> io::Result<Vec<u8>> {
        let payload = b"{\"a\":1}\n[1,2,3]\n".repeat(50);
        let mut w = TransportWriter::new(Vec::new(), format, opts)?;
        w.write_all(&payload)?;
        let encoded = w.finish()?;
        if format == Format::None {
            assert_eq!(encoded, payload);
        } else {
            assert_eq!(Format::from_magic(&encoded), Some(format));
        }
        let mut r = wrap_reader(Cursor::new(encoded), format, None)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let mut out = Vec::new();
        r.read_to_end(&mut out)?;
        assert_eq!(out, payload);
        Ok(out)
    }

    #[test]
    fn every_available_format_roundtrips() -> io::Result<()> {
        for format in Format::ALL.into_iter().filter(|f| f.is_available()) {
            roundtrip(format, &WriteOptions::default())?;
        }
        Ok(())
    }

    #[test]
    fn levels_out_of_range_are_clamped() -> io::Result<()> {
        for format in Format::ALL.into_iter().filter(|f| f.is_available()) {
            roundtrip(format, &WriteOptions::default().compression_level(1000))?;
            roundtrip(format, &WriteOptions::default().compression_level(-1000))?;
        }
        Ok(())
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_with_worker_threads() -> io::Result<()> {
        roundtrip(Format::Zstd, &WriteOptions::default().compression_threads(2))?;
        Ok(())
    }

    #[cfg(feature = "compression-xz")]
    #[test]
    fn xz_with_worker_threads() -> io::Result<()> {
        roundtrip(Format::Xz, &WriteOptions::default().compression_threads(2))?;
        Ok(())
    }

    #[test]
    fn empty_source_reads_as_empty_for_every_format() -> Result<()> {
        for format in Format::ALL.into_iter().filter(|f| f.is_available()) {
            let opts = ReadOptions::default().format(format);
            let (resolved, mut r) = open_source(Cursor::new(Vec::new()), &opts)?;
            assert_eq!(resolved, format);
            let mut out = Vec::new();
            r.read_to_end(&mut out).map_err(|e| Error::io("read", e))?;
            assert!(out.is_empty(), "{format}");
        }
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn open_source_sniffs_without_a_path() -> Result<()> {
        let mut w = TransportWriter::new(Vec::new(), Format::Gzip, &WriteOptions::default())
            .map_err(|e| Error::io("encode", e))?;
        w.write_all(b"7\n").map_err(|e| Error::io("encode", e))?;
        let bytes = w.finish().map_err(|e| Error::io("encode", e))?;

        let (format, mut r) = open_source(Cursor::new(bytes), &ReadOptions::default())?;
        assert_eq!(format, Format::Gzip);
        let mut out = String::new();
        r.read_to_string(&mut out).map_err(|e| Error::io("read", e))?;
        assert_eq!(out, "7\n");
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn concatenated_gzip_members_read_as_one_stream() -> io::Result<()> {
        let mut bytes = Vec::new();
        for chunk in [&b"1\n"[..], b"2\n"] {
            let mut w = TransportWriter::new(Vec::new(), Format::Gzip, &WriteOptions::default())?;
            w.write_all(chunk)?;
            bytes.extend(w.finish()?);
        }
        let mut r = wrap_reader(Cursor::new(bytes), Format::Gzip, Some(4))
            .map_err(|e| io::Error::other(e.to_string()))?;
        let mut out = String::new();
        r.read_to_string(&mut out)?;
        assert_eq!(out, "1\n2\n");
        Ok(())
    }
}
