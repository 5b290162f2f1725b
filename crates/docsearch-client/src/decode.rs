//! Response decoding: raw search envelope to typed `Page`.
//!
//! Decoding runs in two phases. The envelope is first parsed into a
//! schema-free `serde_json::Value` and its required paths are checked; a
//! missing or mistyped path is a hard error. Each hit's `_source` is then
//! projected into a `Document` straight from that `Value` with
//! `Document::deserialize`, with no round trip through bytes. A document that
//! fails projection stops the loop and the page is returned with what was
//! decoded so far, flagged as truncated. Entries after that point are never
//! inspected.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use docsearch_types::{Cursor, Document, Page};

use crate::error::EnvelopeError;

#[derive(Debug, Error)]
enum DocumentError {
    #[error("hit has no _source")]
    MissingSource,

    #[error(transparent)]
    Invalid(#[from] serde_json::Error),
}

fn malformed(reason: impl Into<String>) -> EnvelopeError {
    EnvelopeError(reason.into())
}

/// Decode a raw success body.
pub fn decode_page(body: &[u8]) -> Result<Page, EnvelopeError> {
    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| malformed(format!("response is not valid JSON: {e}")))?;
    decode_envelope(&envelope)
}

/// Decode an already-parsed envelope.
///
/// The page cursor is the first sort value of the last entry in `hits.hits`,
/// even when projection stopped earlier.
pub fn decode_envelope(envelope: &Value) -> Result<Page, EnvelopeError> {
    let total = total_hits(envelope)?;
    if total == 0 {
        return Ok(Page::empty());
    }

    let hits = envelope
        .pointer("/hits/hits")
        .ok_or_else(|| malformed("missing hits.hits"))?
        .as_array()
        .ok_or_else(|| malformed("hits.hits is not an array"))?;

    let cursor = hits
        .last()
        .and_then(first_sort_value)
        .map(|key| Cursor::from_sort_value(key.clone()));

    let mut documents = Vec::with_capacity(hits.len());
    let mut attempted = 0;
    let mut truncated = false;

    for (position, hit) in hits.iter().enumerate() {
        if first_sort_value(hit).is_none() {
            return Err(malformed(format!("hit {position} has no sort value")));
        }

        attempted += 1;
        match project_document(hit) {
            Ok(document) => documents.push(document),
            Err(e) => {
                error!(
                    position,
                    hit = %hit,
                    decoded = documents.len(),
                    error = %e,
                    "Failed to decode document, returning partial page"
                );
                truncated = true;
                break;
            }
        }
    }

    Ok(Page {
        decoded: documents.len(),
        documents,
        total,
        cursor,
        truncated,
        attempted,
    })
}

/// Read `hits.total.value`.
fn total_hits(envelope: &Value) -> Result<u64, EnvelopeError> {
    let total = envelope
        .pointer("/hits/total")
        .ok_or_else(|| malformed("missing hits.total"))?;

    let value = total
        .get("value")
        .ok_or_else(|| malformed("missing hits.total.value"))?
        .as_u64()
        .ok_or_else(|| malformed("hits.total.value is not a non-negative integer"))?;

    if total.get("relation").and_then(Value::as_str) == Some("gte") {
        warn!(total = value, "Engine reported a lower bound for total hits");
    }

    Ok(value)
}

fn first_sort_value(hit: &Value) -> Option<&Value> {
    hit.get("sort")
        .and_then(Value::as_array)
        .and_then(|sort| sort.first())
}

fn project_document(hit: &Value) -> Result<Document, DocumentError> {
    let source = hit.get("_source").ok_or(DocumentError::MissingSource)?;
    Ok(Document::deserialize(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn hit(id: i64) -> Value {
        json!({
            "_index": "users",
            "_id": format!("auto-{id}"),
            "_score": null,
            "_source": {
                "ID": id,
                "CreatedAt": "2024-01-15T10:30:00.123456Z",
                "Username": format!("user {id}")
            },
            "sort": [id]
        })
    }

    fn envelope(total: u64, hits: Vec<Value>) -> Value {
        json!({
            "took": 3,
            "timed_out": false,
            "hits": {
                "total": { "value": total, "relation": "eq" },
                "max_score": null,
                "hits": hits
            }
        })
    }

    #[test]
    fn test_decode_full_page() {
        let page = decode_envelope(&envelope(25, (0..10).map(hit).collect())).unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.len(), 10);
        assert_eq!(page.cursor, Some(Cursor::from(9)));
        assert!(!page.truncated);
        assert_eq!(page.attempted, 10);
        assert_eq!(page.decoded, 10);
        let ids: Vec<i64> = page.documents.iter().map(|d| d.id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        assert_eq!(page.documents[3].username, "user 3");
    }

    #[test]
    fn test_keeps_engine_order() {
        let page = decode_envelope(&envelope(3, vec![hit(5), hit(2), hit(7)])).unwrap();
        let ids: Vec<i64> = page.documents.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![5, 2, 7]);
        assert_eq!(page.cursor, Some(Cursor::from(7)));
    }

    #[test]
    fn test_zero_total_is_empty_page_despite_noise() {
        let body = json!({
            "hits": {
                "total": { "value": 0, "relation": "eq" },
                "hits": "not even an array"
            },
            "unexpected": [1, 2, 3]
        });
        let page = decode_envelope(&body).unwrap();
        assert_eq!(page, Page::empty());
    }

    #[test]
    fn test_missing_total_is_an_error() {
        let body = json!({ "hits": { "hits": [hit(1)] } });
        let err = decode_envelope(&body).unwrap_err();
        assert_eq!(err.to_string(), "missing hits.total");

        let body = json!({ "hits": { "total": {}, "hits": [hit(1)] } });
        assert!(decode_envelope(&body).is_err());

        let body = json!({ "took": 1 });
        assert!(decode_envelope(&body).is_err());
    }

    #[test]
    fn test_wrong_total_shape_is_an_error() {
        for total in [json!(12), json!({ "value": "12" }), json!({ "value": -1 })] {
            let body = json!({ "hits": { "total": total, "hits": [] } });
            assert!(decode_envelope(&body).is_err());
        }
    }

    #[test]
    fn test_missing_hits_array_is_an_error() {
        let body = json!({ "hits": { "total": { "value": 4 } } });
        assert!(decode_envelope(&body).is_err());
    }

    #[test]
    fn test_missing_sort_is_an_error() {
        let mut bad = hit(2);
        bad.as_object_mut().unwrap().remove("sort");
        let body = envelope(3, vec![hit(1), bad, hit(3)]);
        let err = decode_envelope(&body).unwrap_err();
        assert_eq!(err.to_string(), "hit 1 has no sort value");
    }

    #[test]
    fn test_entries_after_truncation_are_not_inspected() {
        let mut broken = hit(1);
        broken["_source"] = json!({ "ID": "x" });
        let unsorted = json!({ "_source": {} });
        let body = envelope(3, vec![hit(0), broken, unsorted]);

        let page = decode_envelope(&body).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.documents[0].id, 0);
        assert_eq!(page.total, 3);
        assert!(page.truncated);
        assert_eq!(page.attempted, 2);
        assert_eq!(page.decoded, 1);
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn test_last_sort_key_is_cursor_of_truncated_page() {
        let mut broken = hit(1);
        broken["_source"] = json!({ "ID": "x" });
        let body = envelope(3, vec![hit(0), broken, hit(2)]);

        let page = decode_envelope(&body).unwrap();

        assert!(page.truncated);
        assert_eq!(page.cursor, Some(Cursor::from(2)));
    }

    #[test]
    fn test_malformed_document_truncates_page() {
        let len = 6;
        for n in 1..=len {
            // n-th entry (1-based) is malformed
            let mut hits: Vec<Value> = (0..len as i64).map(hit).collect();
            hits[n - 1]["_source"] = json!({ "ID": "not a number", "Username": 5 });

            let page = decode_envelope(&envelope(40, hits)).unwrap();

            assert_eq!(page.len(), n - 1, "malformed entry {}", n);
            assert_eq!(page.total, 40);
            assert!(page.truncated);
            assert_eq!(page.attempted, n);
            assert_eq!(page.decoded, n - 1);
            assert_eq!(page.cursor, Some(Cursor::from(len as i64 - 1)));
            let ids: Vec<i64> = page.documents.iter().map(|d| d.id).collect();
            assert_eq!(ids, (0..(n as i64 - 1)).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_missing_source_truncates_page() {
        let mut bad = hit(1);
        bad.as_object_mut().unwrap().remove("_source");
        let page = decode_envelope(&envelope(3, vec![hit(0), bad, hit(2)])).unwrap();

        assert_eq!(page.len(), 1);
        assert!(page.truncated);
        assert_eq!(page.cursor, Some(Cursor::from(2)));
    }

    #[test]
    fn test_total_beyond_page_with_no_hits() {
        // Offset past the end: total is still reported, page is empty.
        let page = decode_envelope(&envelope(25, vec![])).unwrap();
        assert_eq!(page.total, 25);
        assert!(page.is_empty());
        assert!(page.cursor.is_none());
        assert!(!page.truncated);
    }

    #[test]
    fn test_decode_page_rejects_non_json() {
        let err = decode_page(b"not json").unwrap_err();
        assert!(err.to_string().starts_with("response is not valid JSON"));
    }

    #[test]
    fn test_decode_page_from_bytes() {
        let body = serde_json::to_vec(&envelope(1, vec![hit(0)])).unwrap();
        let page = decode_page(&body).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.cursor, Some(Cursor::from(0)));
    }
}
