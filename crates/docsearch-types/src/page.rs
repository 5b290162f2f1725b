//! One page of search results and the cursor that continues it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// Opaque search-after token.
///
/// Holds the engine's raw sort value for the last hit of a page, so integer
/// keys keep full precision and `0` is an ordinary position. "Start from the
/// beginning" is expressed as `Option::<Cursor>::None`, never as a magic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Value);

impl Cursor {
    /// Wrap a sort value taken from a hit's `sort` array.
    pub fn from_sort_value(value: Value) -> Self {
        Self(value)
    }

    /// Parse a cursor typed by a user: JSON scalars are kept as JSON,
    /// anything else is taken as a string key.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) if !value.is_object() && !value.is_array() => Self(value),
            _ => Self(Value::String(raw.to_string())),
        }
    }

    /// The raw sort value, as sent back in `search_after`.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The sort value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }
}

impl From<i64> for Cursor {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single search invocation.
///
/// Documents are in engine order. `total` is the engine's exact match count
/// and may exceed the page length.
///
/// When a document fails to decode, decoding stops and the page keeps what was
/// decoded before it: `truncated` is set and `decoded < attempted`. The cursor
/// still points at the last hit the engine returned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    /// Decoded documents, in engine order
    pub documents: Vec<Document>,

    /// Engine-reported total number of matches
    pub total: u64,

    /// Sort key of the last hit, `None` when the page has no hits
    pub cursor: Option<Cursor>,

    /// Decoding stopped early on a malformed document
    pub truncated: bool,

    /// Number of hits whose decoding was attempted
    pub attempted: usize,

    /// Number of hits decoded successfully
    pub decoded: usize,
}

impl Page {
    /// A page with no hits.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of decoded documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
