//! Compression format resolution.
//!
//! A [`Format`] is decided once per operation, before any transport is opened:
//!
//! 1. An explicit override always wins, even when it contradicts the path.
//! 2. Otherwise the final path extension is matched case-insensitively
//!    (`.gz`, `.xz`, `.bz2`, `.zst`).
//! 3. Reads with an unrecognized extension additionally peek at the first
//!    bytes of the file and match them against each container's magic number.
//!    Writes never sniff.
//! 4. Anything else is plain, uncompressed JSON Lines.

use crate::error::{Error, Result};
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

/// Compression container wrapped around a JSON Lines file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Plain UTF-8 text.
    #[default]
    None,
    Gzip,
    Xz,
    Bzip2,
    Zstd,
}

impl Format {
    /// All formats, in detection order.
    pub const ALL: [Format; 5] = [
        Format::None,
        Format::Gzip,
        Format::Xz,
        Format::Bzip2,
        Format::Zstd,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Format::None => "none",
            Format::Gzip => "gzip",
            Format::Xz => "xz",
            Format::Bzip2 => "bzip2",
            Format::Zstd => "zstd",
        }
    }

    /// File extension (with leading dot) this format is detected from.
    #[must_use]
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Format::None => None,
            Format::Gzip => Some(".gz"),
            Format::Xz => Some(".xz"),
            Format::Bzip2 => Some(".bz2"),
            Format::Zstd => Some(".zst"),
        }
    }

    /// Leading bytes of a stream in this container.
    #[must_use]
    pub const fn magic_bytes(self) -> Option<&'static [u8]> {
        match self {
            Format::None => None,
            Format::Gzip => Some(&[0x1f, 0x8b]),
            Format::Xz => Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]),
            Format::Bzip2 => Some(b"BZh"),
            Format::Zstd => Some(&[0x28, 0xb5, 0x2f, 0xfd]),
        }
    }

    /// Cargo feature that provides the transport for this format.
    #[must_use]
    pub const fn feature(self) -> Option<&'static str> {
        match self {
            Format::None => None,
            Format::Gzip => Some("compression-gzip"),
            Format::Xz => Some("compression-xz"),
            Format::Bzip2 => Some("compression-bzip2"),
            Format::Zstd => Some("compression-zstd"),
        }
    }

    /// Whether this build carries a transport for the format.
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Format::None => true,
            Format::Gzip => cfg!(feature = "compression-gzip"),
            Format::Xz => cfg!(feature = "compression-xz"),
            Format::Bzip2 => cfg!(feature = "compression-bzip2"),
            Format::Zstd => cfg!(feature = "compression-zstd"),
        }
    }

    /// Detect the format from the path's final extension.
    ///
    /// Unknown or missing extensions (including `.jsonl`) resolve to
    /// [`Format::None`]; this never fails.
    pub fn from_path(path: impl AsRef<Path>) -> Format {
        let Some(ext) = path.as_ref().extension() else {
            return Format::None;
        };
        let ext = ext.to_string_lossy().to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|f| f.extension().is_some_and(|e| e[1..] == ext))
            .unwrap_or(Format::None)
    }

    /// Match the first bytes of a stream against known magic numbers.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Option<Format> {
        Format::ALL
            .into_iter()
            .find(|f| f.magic_bytes().is_some_and(|m| head.starts_with(m)))
    }

    /// Peek at a buffered reader and match its head against known magic numbers.
    ///
    /// The reader is not advanced.
    pub fn sniff<R: BufRead>(reader: &mut R) -> std::io::Result<Option<Format>> {
        let head = reader.fill_buf()?;
        Ok(Format::from_magic(head))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "none" | "plain" | "jsonl" | "" => Ok(Format::None),
            "gz" | "gzip" => Ok(Format::Gzip),
            "xz" | "lzma" => Ok(Format::Xz),
            "bz2" | "bzip2" => Ok(Format::Bzip2),
            "zst" | "zstd" | "zstandard" => Ok(Format::Zstd),
            _ => Err(Error::unsupported(s, "unknown format name")),
        }
    }
}

/// Resolve the format for writing: override, then extension.
pub fn resolve(path: impl AsRef<Path>, format_override: Option<Format>) -> Format {
    format_override.unwrap_or_else(|| Format::from_path(path))
}

/// Resolve the format for reading.
///
/// Same as [`resolve`], except that when neither an override nor a known
/// extension applies the head of `reader` is sniffed.
pub fn resolve_for_read<R: BufRead>(
    path: impl AsRef<Path>,
    format_override: Option<Format>,
    reader: &mut R,
) -> std::io::Result<Format> {
    let by_name = resolve(path, format_override);
    if format_override.is_some() || by_name != Format::None {
        return Ok(by_name);
    }
    Ok(Format::sniff(reader)?.unwrap_or(Format::None))
}
