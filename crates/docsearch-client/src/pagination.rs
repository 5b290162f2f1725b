//! Pagination over a whole index.
//!
//! Two strategies:
//! - offset: fixed page size, `from` advancing by the page size until the
//!   record bound is covered. Issues exactly `ceil(bound / size)` requests.
//! - cursor: first page from the start, every later page continues after the
//!   previous page's cursor (search-after). Runs the configured number of
//!   pages unless `stop_on_empty` is set.
//!
//! Pages are appended in fetch order, without dedup or re-sorting. Any page
//! error stops the run and is returned with the documents gathered so far.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use docsearch_types::{Cursor, Document, Page};

use crate::client::SearchClient;
use crate::error::{ClientError, PaginationError};
use crate::transport::Transport;

/// Offset strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPagination {
    /// Page size
    pub size: usize,
    /// Upper bound on the offsets requested
    pub bound: usize,
}

impl Default for OffsetPagination {
    fn default() -> Self {
        Self { size: 10, bound: 100 }
    }
}

/// Cursor strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPagination {
    /// Page size
    pub size: usize,
    /// Number of page requests, including the first
    pub pages: usize,
    /// End early on a page with no hits or once the reported total is reached
    pub stop_on_empty: bool,
}

impl Default for CursorPagination {
    fn default() -> Self {
        Self {
            size: 10,
            pages: 10,
            stop_on_empty: false,
        }
    }
}

/// A pagination strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Offset(OffsetPagination),
    Cursor(CursorPagination),
}

/// Paginate `index` with the given strategy.
pub async fn paginate<T: Transport>(
    client: &SearchClient<T>,
    index: &str,
    strategy: Strategy,
    cancel: &CancellationToken,
) -> Result<Vec<Document>, PaginationError> {
    match strategy {
        Strategy::Offset(params) => paginate_offset(client, index, params, cancel).await,
        Strategy::Cursor(params) => paginate_cursor(client, index, params, cancel).await,
    }
}

fn invalid_size(index: &str) -> PaginationError {
    PaginationError {
        iteration: 0,
        index: index.to_string(),
        partial: Vec::new(),
        source: ClientError::InvalidArgument("page size must be greater than zero".to_string()),
    }
}

fn note_truncation(page: &Page, iteration: usize) {
    if page.truncated {
        warn!(
            iteration,
            attempted = page.attempted,
            decoded = page.decoded,
            "Page truncated by a malformed document"
        );
    }
}

/// Offset pagination: `from = 0, size, 2 * size, ...` while `from < bound`.
///
/// Does not stop on empty pages: the number of requests depends only on
/// `bound` and `size`.
pub async fn paginate_offset<T: Transport>(
    client: &SearchClient<T>,
    index: &str,
    params: OffsetPagination,
    cancel: &CancellationToken,
) -> Result<Vec<Document>, PaginationError> {
    let index = client.resolve_index(index);
    if params.size == 0 {
        return Err(invalid_size(index));
    }

    let mut result = Vec::new();

    for (iteration, from) in (0..params.bound).step_by(params.size).enumerate() {
        let page = match client.load(index, from, params.size, None, cancel).await {
            Ok(page) => page,
            Err(source) => {
                return Err(PaginationError {
                    iteration,
                    index: index.to_string(),
                    partial: result,
                    source,
                })
            }
        };

        debug!(iteration, from, fetched = page.len(), total = page.total, "Fetched offset page");
        note_truncation(&page, iteration);
        result.extend(page.documents);
    }

    info!(index = %index, documents = result.len(), "Offset pagination finished");
    Ok(result)
}

/// Cursor pagination: each page continues after the previous page's cursor.
///
/// A page without hits carries no cursor; the next request reuses the last
/// cursor seen rather than restarting from the beginning.
pub async fn paginate_cursor<T: Transport>(
    client: &SearchClient<T>,
    index: &str,
    params: CursorPagination,
    cancel: &CancellationToken,
) -> Result<Vec<Document>, PaginationError> {
    let index = client.resolve_index(index);
    if params.size == 0 {
        return Err(invalid_size(index));
    }

    let mut result = Vec::new();
    let mut cursor: Option<Cursor> = None;

    for iteration in 0..params.pages {
        let page = match client
            .load(index, 0, params.size, cursor.as_ref(), cancel)
            .await
        {
            Ok(page) => page,
            Err(source) => {
                return Err(PaginationError {
                    iteration,
                    index: index.to_string(),
                    partial: result,
                    source,
                })
            }
        };

        debug!(
            iteration,
            fetched = page.len(),
            total = page.total,
            cursor = ?page.cursor.as_ref().map(ToString::to_string),
            "Fetched cursor page"
        );
        note_truncation(&page, iteration);

        let total = page.total;
        let exhausted = page.cursor.is_none();
        if let Some(next) = page.cursor {
            cursor = Some(next);
        }
        result.extend(page.documents);

        if params.stop_on_empty && (exhausted || result.len() as u64 >= total) {
            debug!(iteration, "No more results, stopping early");
            break;
        }
    }

    info!(index = %index, documents = result.len(), "Cursor pagination finished");
    Ok(result)
}
