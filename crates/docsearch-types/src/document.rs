//! The typed document stored in the search engine.
//!
//! The persisted form uses the engine-side field names verbatim:
//!
//! ```json
//! { "ID": 7, "CreatedAt": "2024-01-15T10:30:00.123456789Z", "Username": "user 7" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the field every search is sorted on.
pub const ID_FIELD: &str = "ID";

/// A stored user document.
///
/// Identity is `id`; uniqueness is left to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Numeric identifier, also the sort key for pagination
    #[serde(rename = "ID")]
    pub id: i64,

    /// Creation time, RFC 3339 on the wire
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,

    /// Display name
    #[serde(rename = "Username")]
    pub username: String,
}

impl Document {
    /// Create a new document.
    pub fn new(id: i64, created_at: DateTime<Utc>, username: impl Into<String>) -> Self {
        Self {
            id,
            created_at,
            username: username.into(),
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from the JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
