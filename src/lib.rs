//! # Ironlines
//!
//! **Streaming JSON Lines I/O** for Rust, with transparent gzip, xz, bzip2
//! and zstd compression.
//!
//! A JSON Lines file holds one compact JSON document per `\n`-terminated
//! line. Ironlines reads such files lazily, one record per pull, writes them
//! from any iterator, and appends to them without rewriting what is already
//! there. Compression is chosen from the file extension (or forced through
//! the options) and is invisible to the caller.
//!
//! ## Key Features
//!
//! - **Lazy reads** - [`stream`] decodes on demand with memory bounded by one line
//! - **Eager reads** - [`load`] collects a whole file into a `Vec<T>`
//! - **Writes** - [`save`] truncates, [`append`] extends, both return record counts
//! - **Compression** - `.gz`, `.xz`, `.bz2`, `.zst`, each behind a feature flag
//! - **Typed records** - any `serde` type, or [`serde_json::Value`] for untyped data
//! - **Distinguishable errors** - I/O, unsupported format, decode and encode failures
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironlines::*;
//! use serde_json::{Value, json};
//!
//! # fn main() -> ironlines::Result<()> {
//! let records = vec![json!({"hello": "world"}), json!([1.1, 2.2, 3.3]), json!(42)];
//! save("data.jsonl.zst", &records, &WriteOptions::default())?;
//!
//! // Lazy: one record per pull
//! for record in stream::<Value>("data.jsonl.zst", &ReadOptions::default())? {
//!     println!("{}", record?);
//! }
//!
//! // Eager
//! let all: Vec<Value> = load("data.jsonl.zst", &ReadOptions::default())?;
//! assert_eq!(all, records);
//!
//! // Append to a file whose last line lacks its newline
//! append(
//!     "legacy.jsonl",
//!     [json!(["a", "b", "c"])],
//!     &AppendOptions::default().newline_present(false),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Typed Records
//!
//! ```no_run
//! use ironlines::{ReadOptions, WriteOptions, load, save};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Event { id: u32, kind: String }
//!
//! # fn main() -> ironlines::Result<()> {
//! save("events.jsonl.gz", [Event { id: 1, kind: "open".into() }], &WriteOptions::default())?;
//! let events: Vec<Event> = load("events.jsonl.gz", &ReadOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Fallback Conversion
//!
//! Records the JSON encoder rejects (maps with non-string keys, custom
//! `Serialize` impls that fail) can be converted through a fallback, tried
//! once per record:
//!
//! ```no_run
//! use ironlines::{WriteOptions, save_with};
//! use serde_json::{Value, json};
//! use std::collections::BTreeMap;
//!
//! # fn main() -> ironlines::Result<()> {
//! let by_pair: BTreeMap<(u8, u8), u32> = [((0, 1), 10)].into();
//! save_with("pairs.jsonl", [by_pair], |m| {
//!     Some(Value::Array(m.iter().map(|(k, v)| json!([k, v])).collect()))
//! }, &WriteOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Compression
//!
//! | Extension | Format  | Feature             | Crate    |
//! |-----------|---------|---------------------|----------|
//! | `.gz`     | gzip    | `compression-gzip`  | `flate2` |
//! | `.xz`     | xz      | `compression-xz`    | `xz2`    |
//! | `.bz2`    | bzip2   | `compression-bzip2` | `bzip2`  |
//! | `.zst`    | zstd    | `compression-zstd`  | `zstd`   |
//!
//! All are enabled by default. See [`io::compression`] for thread and level
//! handling and [`io::format`] for detection rules.
//!
//! ## Logging
//!
//! Ironlines emits `tracing` events at `debug` and `trace` level (opened
//! transports, resolved formats, record counts). It never installs a
//! subscriber.

pub mod error;
pub mod io;
pub mod options;
pub mod testing;

pub use error::{Error, Result};
pub use io::compression::TransportWriter;
pub use io::encode::EncodeFlags;
pub use io::format::Format;
pub use io::jsonl::{
    JsonlStream, append, append_record, append_with, load, save, save_with, stream,
};
pub use io::lines::{JsonlReader, JsonlWriter};
pub use options::{AppendOptions, ReadOptions, WriteOptions};
