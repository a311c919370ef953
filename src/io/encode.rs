//! Record serialization for the write path.
//!
//! Records are serialized into a caller-owned line buffer rather than straight
//! into the transport, so a record that fails halfway leaves no bytes behind
//! and can be retried through the fallback conversion.

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter};
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use std::ops::{BitOr, BitOrAssign};

/// Serialization flags handed to the encoder unchanged.
///
/// Bits without a meaning below are carried along and ignored.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EncodeFlags(u32);

impl EncodeFlags {
    pub const NONE: EncodeFlags = EncodeFlags(0);
    /// Emit object keys in lexicographic order, at every depth.
    pub const SORT_KEYS: EncodeFlags = EncodeFlags(1 << 5);
    /// Write every non-ASCII character as a `\uXXXX` escape.
    pub const ESCAPE_NON_ASCII: EncodeFlags = EncodeFlags(1 << 12);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        EncodeFlags(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: EncodeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EncodeFlags {
    type Output = EncodeFlags;

    fn bitor(self, rhs: Self) -> Self {
        EncodeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EncodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<u32> for EncodeFlags {
    fn from(bits: u32) -> Self {
        EncodeFlags(bits)
    }
}

impl fmt::Debug for EncodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodeFlags({:#x})", self.0)
    }
}

/// Compact formatter that escapes everything outside ASCII.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> =
                entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn write_with<T, F>(buf: &mut Vec<u8>, value: &T, formatter: F) -> serde_json::Result<()>
where
    T: Serialize + ?Sized,
    F: Formatter,
{
    let mut ser = serde_json::Serializer::with_formatter(buf, formatter);
    value.serialize(&mut ser)
}

/// Serialize `value` as one compact JSON document into `buf`.
///
/// `buf` is cleared first; on error its content is unspecified. The output
/// never contains a literal newline: JSON strings escape `\n`, and compact
/// formatting adds no whitespace between tokens.
///
/// # Errors
/// Returns the serializer's error when `value` is not representable as JSON
/// (for example a map with non-string keys).
pub fn encode_into<T>(buf: &mut Vec<u8>, value: &T, flags: EncodeFlags) -> serde_json::Result<()>
where
    T: Serialize + ?Sized,
{
    buf.clear();
    if flags.contains(EncodeFlags::SORT_KEYS) {
        let sorted = sort_keys(serde_json::to_value(value)?);
        return encode_value(buf, &sorted, flags);
    }
    encode_value(buf, value, flags)
}

fn encode_value<T>(buf: &mut Vec<u8>, value: &T, flags: EncodeFlags) -> serde_json::Result<()>
where
    T: Serialize + ?Sized,
{
    if flags.contains(EncodeFlags::ESCAPE_NON_ASCII) {
        write_with(buf, value, AsciiFormatter)
    } else {
        write_with(buf, value, CompactFormatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn encode(value: &Value, flags: EncodeFlags) -> String {
        let mut buf = Vec::new();
        encode_into(&mut buf, value, flags).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn compact_output() {
        let v = json!({"hello": "world", "list": [1.1, 2.2, 3.3], "n": null});
        let s = encode(&v, EncodeFlags::NONE);
        assert!(!s.contains(' '));
        assert!(!s.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&s).unwrap(), v);
    }

    #[test]
    fn embedded_newlines_are_escaped() {
        assert_eq!(encode(&json!("a\nb"), EncodeFlags::NONE), r#""a\nb""#);
    }

    #[test]
    fn sort_keys_recurses() {
        let mut inner = Map::new();
        inner.insert("z".into(), json!(1));
        inner.insert("a".into(), json!(2));
        let mut outer = Map::new();
        outer.insert("y".into(), Value::Array(vec![Value::Object(inner)]));
        outer.insert("b".into(), json!(true));
        assert_eq!(
            encode(&Value::Object(outer), EncodeFlags::SORT_KEYS),
            r#"{"b":true,"y":[{"a":2,"z":1}]}"#
        );
    }

    #[test]
    fn escape_non_ascii() {
        let v = json!({"k": "café 😀", "q": "\"x\""});
        let s = encode(&v, EncodeFlags::ESCAPE_NON_ASCII | EncodeFlags::SORT_KEYS);
        assert_eq!(s, r#"{"k":"caf\u00e9 \ud83d\ude00","q":"\"x\""}"#);
        assert!(s.is_ascii());
        assert_eq!(serde_json::from_str::<Value>(&s).unwrap(), v);
    }

    #[test]
    fn unknown_bits_are_carried() {
        let flags = EncodeFlags::from_bits(0b1) | EncodeFlags::SORT_KEYS;
        assert_eq!(flags.bits(), 0b1 | (1 << 5));
        assert!(flags.contains(EncodeFlags::SORT_KEYS));
        assert!(!flags.contains(EncodeFlags::ESCAPE_NON_ASCII));
        assert_eq!(encode(&json!([1]), flags), "[1]");
    }

    #[test]
    fn non_string_keys_fail() {
        let mut m = HashMap::new();
        m.insert((1, 2), "pair");
        let mut buf = Vec::new();
        assert!(encode_into(&mut buf, &m, EncodeFlags::NONE).is_err());
        assert!(encode_into(&mut buf, &m, EncodeFlags::SORT_KEYS).is_err());
    }
}
