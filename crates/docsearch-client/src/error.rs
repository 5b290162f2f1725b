//! Error types for the search client.

use thiserror::Error;

use docsearch_types::Document;

/// Failures reaching the engine at all.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request could not be built (bad URL, bad header value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, TLS or timeout failure
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// A search success body that does not have the expected shape.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct EnvelopeError(pub String);

/// Errors that can occur when using the search client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The engine could not be reached
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The engine answered with a non-success status and a readable error body
    #[error("Engine returned {status} for index '{index}': {}{reason}", type_prefix(.error_type))]
    Engine {
        index: String,
        status: u16,
        error_type: Option<String>,
        reason: String,
    },

    /// The engine answered with a non-success status and an unreadable body
    #[error("Engine returned {status} for index '{index}' with an unparseable error body: {source}")]
    ErrorBody {
        index: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The success response does not have the expected envelope shape
    #[error("Malformed response envelope from index '{index}': {source}")]
    Envelope {
        index: String,
        #[source]
        source: EnvelopeError,
    },

    /// A query or document could not be serialized
    #[error("Serialization failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The index mapping file could not be read
    #[error("Failed to read mapping schema {path}: {source}")]
    Mapping {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Caller input rejected before any request was issued
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,
}

fn type_prefix(error_type: &Option<String>) -> String {
    error_type
        .as_deref()
        .map(|t| format!("{t}: "))
        .unwrap_or_default()
}

impl ClientError {
    /// Whether the error came from cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

/// A pagination run that stopped on an error.
///
/// Keeps the documents gathered before the failing page so callers can decide
/// whether a partial result is usable.
#[derive(Error, Debug)]
#[error("Pagination of index '{index}' failed at iteration {iteration} after {} documents: {source}", .partial.len())]
pub struct PaginationError {
    /// Zero-based iteration (page request) that failed
    pub iteration: usize,
    /// Index being paginated
    pub index: String,
    /// Documents accumulated before the failure
    pub partial: Vec<Document>,
    #[source]
    pub source: ClientError,
}

impl PaginationError {
    /// Consume the error, returning the partial result.
    pub fn into_partial(self) -> Vec<Document> {
        self.partial
    }
}
