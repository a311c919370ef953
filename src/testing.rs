//! Testing utilities for code that reads and writes JSON Lines.
//!
//! This module provides:
//!
//! - **Fixtures**: the canonical sample records and their exact on-disk bytes
//! - **Mock I/O**: temporary files and directories that clean up after themselves
//! - **Assertions**: byte-exact file comparison and independent decompression
//!
//! # Quick Start
//!
//! ```no_run
//! use ironlines::testing::*;
//! use ironlines::{WriteOptions, save};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = TempDirPath::new()?;
//! let path = dir.file_path("sample.jsonl.gz");
//! save(&path, sample_records(), &WriteOptions::default())?;
//! assert_eq!(decompressed_bytes(&path)?, SAMPLE_JSONL);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
