//! Search invocation: shapes the HTTP request for a query and turns engine
//! failure responses into typed errors.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::ClientError;
use crate::query::SearchQuery;
use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

/// Per-call search options taken from settings.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Engine-side search timeout
    pub timeout: Duration,
    /// Ask for exact totals instead of a lower bound
    pub track_total_hits: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            track_total_hits: true,
        }
    }
}

/// Build the `_search` request for `query` against `index`.
///
/// Offset mode sends `from` and `size`; cursor mode sends only `size`, the
/// cursor travels in the body as `search_after`.
pub fn search_request(
    index: &str,
    query: &SearchQuery,
    options: SearchOptions,
) -> Result<TransportRequest, ClientError> {
    let body = serde_json::to_vec(&query.body)?;

    let mut request = TransportRequest::new(Method::Post, format!("{}/_search", index))
        .with_param("timeout", format!("{}ms", options.timeout.as_millis()));

    if let Some(from) = query.from() {
        request = request.with_param("from", from);
    }

    Ok(request
        .with_param("size", query.size())
        .with_param("track_total_hits", options.track_total_hits)
        .with_body(body))
}

/// Send a request, giving up as soon as `cancel` fires.
pub async fn send_cancellable<T: Transport + ?Sized>(
    transport: &T,
    request: TransportRequest,
    cancel: &CancellationToken,
) -> Result<TransportResponse, ClientError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = transport.send(request) => result.map_err(ClientError::from),
    }
}

/// Run a search and return the success body.
pub async fn execute_search<T: Transport + ?Sized>(
    transport: &T,
    index: &str,
    query: &SearchQuery,
    options: SearchOptions,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, ClientError> {
    let request = search_request(index, query, options)?;
    let response = send_cancellable(transport, request, cancel).await?;

    if !response.is_success() {
        error!(
            index = %index,
            status = response.status,
            query = %query.body,
            "Search failed"
        );
        return Err(engine_error(index, response.status, &response.body));
    }

    Ok(response.body)
}

#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    error: EngineErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EngineErrorDetail {
    Structured {
        #[serde(rename = "type")]
        error_type: String,
        #[serde(default)]
        reason: Option<String>,
    },
    Message(String),
}

/// Decode an engine failure body into a `ClientError`.
///
/// A JSON body that is not in the engine's error shape is rendered whole into
/// the reason; a body that is not JSON at all is an `ErrorBody` error.
pub fn engine_error(index: &str, status: u16, body: &[u8]) -> ClientError {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(source) => {
            return ClientError::ErrorBody {
                index: index.to_string(),
                status,
                source,
            }
        }
    };

    match EngineErrorBody::deserialize(&value) {
        Ok(EngineErrorBody {
            error: EngineErrorDetail::Structured { error_type, reason },
        }) => ClientError::Engine {
            index: index.to_string(),
            status,
            reason: reason.unwrap_or_else(|| error_type.clone()),
            error_type: Some(error_type),
        },
        Ok(EngineErrorBody {
            error: EngineErrorDetail::Message(reason),
        }) => ClientError::Engine {
            index: index.to_string(),
            status,
            error_type: None,
            reason,
        },
        Err(_) => ClientError::Engine {
            index: index.to_string(),
            status,
            error_type: None,
            reason: value.to_string(),
        },
    }
}
