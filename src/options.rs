//! Per-call configuration for reads, writes and appends.
//!
//! Options are plain structs with public fields and a [`Default`]; the
//! builder methods are shorthand for struct-update syntax:
//!
//! ```
//! use ironlines::{Format, WriteOptions};
//!
//! let opts = WriteOptions {
//!     format: Some(Format::Zstd),
//!     compression_level: Some(19),
//!     ..Default::default()
//! };
//! assert_eq!(opts, WriteOptions::default().format(Format::Zstd).compression_level(19));
//! ```

use crate::io::encode::EncodeFlags;
use crate::io::format::Format;

/// Options for [`stream`](crate::stream) and [`load`](crate::load).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Force a compression format instead of detecting it.
    pub format: Option<Format>,
    /// Decoder parallelism hint. `None` leaves the choice to the transport.
    pub decompression_threads: Option<u32>,
    /// Skip empty and whitespace-only lines instead of failing on them.
    pub skip_blank_lines: bool,
}

impl ReadOptions {
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn decompression_threads(mut self, threads: u32) -> Self {
        self.decompression_threads = Some(threads);
        self
    }

    #[must_use]
    pub fn skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }
}

/// Options for [`save`](crate::save).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Force a compression format instead of detecting it from the extension.
    pub format: Option<Format>,
    /// Codec-specific effort. Out-of-range values are clamped to what the
    /// codec accepts; ignored for [`Format::None`].
    pub compression_level: Option<i32>,
    /// Encoder parallelism hint, honored by zstd and xz.
    pub compression_threads: Option<u32>,
    /// Serialization flags, handed to the encoder unchanged.
    pub flags: EncodeFlags,
}

impl WriteOptions {
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }

    #[must_use]
    pub fn compression_threads(mut self, threads: u32) -> Self {
        self.compression_threads = Some(threads);
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: EncodeFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Options for [`append`](crate::append).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendOptions {
    /// Caller's claim that the target already ends with `\n` (or is empty or
    /// missing). When `false`, one `\n` is written before the first record.
    ///
    /// The claim is trusted, not checked: passing `false` for a file that
    /// does end with `\n` leaves a blank line in it.
    pub newline_present: bool,
    pub write: WriteOptions,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            newline_present: true,
            write: WriteOptions::default(),
        }
    }
}

impl AppendOptions {
    #[must_use]
    pub fn newline_present(mut self, present: bool) -> Self {
        self.newline_present = present;
        self
    }

    #[must_use]
    pub fn write(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }
}

impl From<WriteOptions> for AppendOptions {
    fn from(write: WriteOptions) -> Self {
        Self {
            newline_present: true,
            write,
        }
    }
}
