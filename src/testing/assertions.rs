//! Assertion helpers for JSON Lines output.
//!
//! [`decompressed_bytes`] decodes files with the codec crates directly rather
//! than through this crate's transports, so tests can check that what was
//! written is a valid container for an independent reader.

use crate::io::format::Format;
use std::io::Read;
use std::path::Path;

/// Assert that the file at `path` holds exactly `expected`.
///
/// On mismatch the message shows both sides as (lossy) UTF-8.
///
/// # Panics
///
/// Panics if the file cannot be read or its content differs.
///
/// # Example
///
/// ```
/// use ironlines::testing::{assert_file_bytes, mock_raw_file};
///
/// let temp = mock_raw_file("jsonl", b"42\n").unwrap();
/// assert_file_bytes(temp.path(), b"42\n");
/// ```
pub fn assert_file_bytes(path: impl AsRef<Path>, expected: &[u8]) {
    let path = path.as_ref();
    let actual = std::fs::read(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    assert!(
        actual == expected,
        "File content mismatch for {}:\n  Expected: {:?}\n  Actual: {:?}",
        path.display(),
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(&actual),
    );
}

/// Read `path` and decompress it according to its extension.
///
/// Concatenated members/streams/frames are decoded in sequence.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a valid container for
/// its extension, or the codec is not compiled in.
pub fn decompressed_bytes(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
    let path = path.as_ref();
    let raw = std::fs::read(path)?;
    decompress(Format::from_path(path), &raw)
}

/// Decompress `raw` as `format`.
///
/// # Errors
///
/// Returns an error if `raw` is not a valid container or the codec is not
/// compiled in.
pub fn decompress(format: Format, raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        Format::None => out.extend_from_slice(raw),
        #[cfg(feature = "compression-gzip")]
        Format::Gzip => {
            flate2::read::MultiGzDecoder::new(raw).read_to_end(&mut out)?;
        }
        #[cfg(feature = "compression-zstd")]
        Format::Zstd => out = zstd::stream::decode_all(raw)?,
        #[cfg(feature = "compression-bzip2")]
        Format::Bzip2 => {
            bzip2::read::MultiBzDecoder::new(raw).read_to_end(&mut out)?;
        }
        #[cfg(feature = "compression-xz")]
        Format::Xz => {
            xz2::read::XzDecoder::new_multi_decoder(raw).read_to_end(&mut out)?;
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("no {other} decoder in this build"),
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_raw_file;

    #[test]
    fn plain_files_pass_through() {
        let temp = mock_raw_file("jsonl", b"1\n").unwrap();
        assert_eq!(decompressed_bytes(temp.path()).unwrap(), b"1\n");
        assert_file_bytes(temp.path(), b"1\n");
    }

    #[test]
    #[should_panic(expected = "File content mismatch")]
    fn mismatch_panics() {
        let temp = mock_raw_file("jsonl", b"1\n").unwrap();
        assert_file_bytes(temp.path(), b"2\n");
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn garbage_is_not_gzip() {
        assert!(decompress(Format::Gzip, b"definitely not gzip").is_err());
    }
}
