//! Error types for JSON Lines I/O.
//!
//! Every operation in this crate fails with one [`Error`] whose variant tells
//! the caller what went wrong: the file system ([`Error::Io`]), the
//! compression container ([`Error::UnsupportedFormat`]), the data on disk
//! ([`Error::Decode`]) or the data being written ([`Error::Encode`]).

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by `stream`, `load`, `save` and `append`.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened, read, written or finalized.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The requested compression format has no transport in this build.
    #[error("unsupported compression format '{format}': {reason}")]
    UnsupportedFormat { format: String, reason: String },

    /// A line is not a valid JSON document for the requested record type.
    #[error("parse JSONL line {line}{location}: {source}")]
    Decode {
        /// 1-based line number within the decompressed stream.
        line: u64,
        /// `" in <path>"` when the stream came from a file, empty otherwise.
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be represented as JSON, even after the fallback.
    #[error("serialize item #{index}{location}: {source}")]
    Encode {
        /// 0-based position of the record in the input sequence.
        index: u64,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn unsupported(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// `true` for file system and transport failures.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    #[must_use]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }

    /// `true` when a line on disk was not valid JSON.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    #[must_use]
    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }

    /// Line number of a decode failure.
    #[must_use]
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::Decode { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Builds the `" in <path>"` suffix used in decode/encode messages.
pub(crate) fn location(label: Option<&str>) -> String {
    label.map(|l| format!(" in {l}")).unwrap_or_default()
}
