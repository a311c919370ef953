//! Pre-built records and their encoded form.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Exact bytes of [`sample_records`] written as JSON Lines.
pub const SAMPLE_JSONL: &[u8] = b"{\"hello\":\"world\"}\n[1.1,2.2,3.3]\n42\ntrue\nnull\n";

/// One record of every JSON kind: object, array of floats, integer, boolean, null.
///
/// # Example
///
/// ```
/// use ironlines::testing::sample_records;
///
/// let records = sample_records();
/// assert_eq!(records.len(), 5);
/// ```
#[must_use]
pub fn sample_records() -> Vec<Value> {
    vec![
        json!({"hello": "world"}),
        json!([1.1, 2.2, 3.3]),
        json!(42),
        json!(true),
        Value::Null,
    ]
}

/// Record appended to [`SAMPLE_JSONL`] in append scenarios.
#[must_use]
pub fn appended_record() -> Value {
    json!(["a", "b", "c"])
}

/// Typed record for tests that go through `serde` derives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEvent {
    pub id: u32,
    pub name: String,
    pub score: f64,
    pub tags: Vec<String>,
}

/// A handful of [`SampleEvent`]s, including non-ASCII text and an embedded newline.
#[must_use]
pub fn sample_events() -> Vec<SampleEvent> {
    vec![
        SampleEvent {
            id: 1,
            name: "Alice".to_string(),
            score: 3.14,
            tags: vec!["admin".to_string()],
        },
        SampleEvent {
            id: 2,
            name: "Zoë".to_string(),
            score: -2.5,
            tags: vec![],
        },
        SampleEvent {
            id: 3,
            name: "line one\nline two".to_string(),
            score: 0.0,
            tags: vec!["multi".to_string(), "line".to_string()],
        },
    ]
}

/// `count` small objects `{"id":i,"payload":"..."}`, for volume tests.
#[must_use]
pub fn numbered_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": i, "payload": format!("record-{i:06}")}))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_bytes_match_records() {
        let lines: Vec<Value> = SAMPLE_JSONL
            .split(|&b| b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_slice(l).unwrap())
            .collect();
        assert_eq!(lines, sample_records());
    }

    #[test]
    fn numbered_records_are_ordered() {
        let recs = numbered_records(3);
        assert_eq!(recs[2]["id"], 2);
        assert_eq!(recs[0]["payload"], "record-000000");
    }
}
