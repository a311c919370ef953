pub mod compression;
pub mod encode;
pub mod format;
pub mod jsonl;
pub mod lines;
