//! Query construction for paginated match-all searches.
//!
//! Every query sorts ascending on the document identifier. Search-after
//! continuation is only correct over a total, stable order, so the sort
//! clause is never optional.

use serde_json::{json, Value};

use docsearch_types::document::ID_FIELD;
use docsearch_types::Cursor;

/// How a query selects its page.
#[derive(Debug, Clone, PartialEq)]
pub enum Paging {
    /// Skip `from` hits, take `size`
    Offset { from: usize, size: usize },
    /// Take `size` hits strictly after the hit whose sort key is `cursor`
    After { size: usize, cursor: Cursor },
}

/// A fully-formed search: JSON body plus paging parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub body: Value,
    pub paging: Paging,
}

impl SearchQuery {
    /// Requested page size.
    pub fn size(&self) -> usize {
        match &self.paging {
            Paging::Offset { size, .. } | Paging::After { size, .. } => *size,
        }
    }

    /// Offset, only present in offset mode.
    pub fn from(&self) -> Option<usize> {
        match &self.paging {
            Paging::Offset { from, .. } => Some(*from),
            Paging::After { .. } => None,
        }
    }

    /// Continuation cursor, only present in cursor mode.
    pub fn cursor(&self) -> Option<&Cursor> {
        match &self.paging {
            Paging::Offset { .. } => None,
            Paging::After { cursor, .. } => Some(cursor),
        }
    }
}

/// Build a match-all query sorted ascending by identifier.
///
/// With no cursor the page starts at `offset`. With a cursor the page starts
/// right after the cursor's hit and `offset` is ignored.
pub fn build_query(offset: usize, size: usize, cursor: Option<&Cursor>) -> SearchQuery {
    let mut body = json!({
        "query": { "match_all": {} },
        "sort": [ { ID_FIELD: { "order": "asc" } } ],
    });

    let paging = match cursor {
        Some(cursor) => {
            body["search_after"] = json!([cursor.as_value()]);
            Paging::After {
                size,
                cursor: cursor.clone(),
            }
        }
        None => Paging::Offset { from: offset, size },
    };

    SearchQuery { body, paging }
}
