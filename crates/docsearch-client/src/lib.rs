//! Client library for paging through documents in an Elasticsearch-compatible
//! search engine.
//!
//! This crate provides:
//! - `SearchClient` for creating indices, storing documents and loading pages
//! - offset and cursor (search-after) pagination over a whole index
//! - a `Transport` seam with an HTTP implementation and an in-memory mock
//!
//! # Example
//!
//! ```rust,no_run
//! use docsearch_client::{paginate_cursor, CursorPagination, SearchClient};
//! use docsearch_types::Settings;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(None)?;
//!     let client = SearchClient::from_settings(&settings)?;
//!     let cancel = CancellationToken::new();
//!
//!     let users = paginate_cursor(&client, "", CursorPagination::default(), &cancel).await?;
//!     println!("Fetched {} documents", users.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod decode;
pub mod error;
pub mod invoker;
pub mod mock;
pub mod pagination;
pub mod query;
pub mod transport;

pub use client::{ClientConfig, SearchClient};
pub use decode::{decode_envelope, decode_page};
pub use error::{ClientError, EnvelopeError, PaginationError, TransportError};
pub use invoker::SearchOptions;
pub use mock::MockTransport;
pub use pagination::{
    paginate, paginate_cursor, paginate_offset, CursorPagination, OffsetPagination, Strategy,
};
pub use query::{build_query, Paging, SearchQuery};
pub use transport::{
    HttpTransport, HttpTransportConfig, Method, Transport, TransportRequest, TransportResponse,
};

// Re-export shared types for convenience
pub use docsearch_types::{Cursor, Document, Page};
