// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decodes render-service queue entries.
//!
//! The render service reports queued/running work as a positional JSON
//! tuple — `[number, promptId, promptGraph, extraData, ...]` — not a
//! tagged object, and it has historically appended extra positional
//! fields across versions. A derived struct decode would break the
//! instant the service adds a field; this reads positionally by index
//! and only requires the first four slots to be present.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueDecodeError {
    #[error("queue entry is not a JSON array")]
    NotAnArray,
    #[error("queue entry has {0} elements, need at least 4")]
    TooShort(usize),
    #[error("queue entry slot {0} ({1}) has the wrong type")]
    WrongType(usize, &'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub number: i64,
    pub prompt_id: String,
    pub prompt_graph: Value,
    pub extra_data: Value,
}

/// Decode one queue entry from its positional tuple representation.
pub fn decode_queue_entry(value: &Value) -> Result<QueueEntry, QueueDecodeError> {
    let array = value.as_array().ok_or(QueueDecodeError::NotAnArray)?;
    if array.len() < 4 {
        return Err(QueueDecodeError::TooShort(array.len()));
    }

    let number = array[0].as_i64().ok_or(QueueDecodeError::WrongType(0, "number"))?;
    let prompt_id =
        array[1].as_str().ok_or(QueueDecodeError::WrongType(1, "string"))?.to_string();
    let prompt_graph = array[2].clone();
    let extra_data = array[3].clone();

    Ok(QueueEntry { number, prompt_id, prompt_graph, extra_data })
}

/// Decode every entry in a queue listing array, skipping (and logging) any
/// entry that fails to decode rather than failing the whole batch.
pub fn decode_queue_list(value: &Value) -> Vec<QueueEntry> {
    let Some(array) = value.as_array() else { return Vec::new() };
    array
        .iter()
        .filter_map(|entry| match decode_queue_entry(entry) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(%err, "skipping malformed queue entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_minimal_four_element_tuple() {
        let entry = json!([1, "abc-123", {"nodes": {}}, {"client_id": "x"}]);
        let decoded = decode_queue_entry(&entry).expect("decode");
        assert_eq!(decoded.number, 1);
        assert_eq!(decoded.prompt_id, "abc-123");
    }

    #[test]
    fn decodes_tuple_with_extra_trailing_fields() {
        let entry = json!([2, "def-456", {}, {}, "unexpected-extra-field"]);
        let decoded = decode_queue_entry(&entry).expect("decode");
        assert_eq!(decoded.prompt_id, "def-456");
    }

    #[test]
    fn rejects_short_tuple() {
        let entry = json!([1, "abc-123"]);
        assert!(matches!(decode_queue_entry(&entry), Err(QueueDecodeError::TooShort(2))));
    }

    #[test]
    fn rejects_non_array() {
        let entry = json!({"not": "an array"});
        assert!(matches!(decode_queue_entry(&entry), Err(QueueDecodeError::NotAnArray)));
    }

    #[test]
    fn list_decode_skips_malformed_entries_and_keeps_good_ones() {
        let list = json!([
            [1, "a", {}, {}],
            ["bad"],
            [2, "b", {}, {}],
        ]);
        let decoded = decode_queue_list(&list);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].prompt_id, "a");
        assert_eq!(decoded[1].prompt_id, "b");
    }
}
