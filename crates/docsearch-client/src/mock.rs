//! In-memory engine for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use docsearch_types::Document;

use crate::error::TransportError;
use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

/// Mock transport that answers like a small search engine.
///
/// Supports index creation, document store and match-all searches sorted by
/// `ID` with `from`/`size` or `search_after`. Individual requests can be
/// scripted to fail, which makes it useful for testing without a cluster.
pub struct MockTransport {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    indices: HashMap<String, Vec<Value>>,
    requests: Vec<TransportRequest>,
    scripted: HashMap<usize, Result<TransportResponse, TransportError>>,
}

impl MockTransport {
    /// Create an engine with no indices.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Create an engine with `index` holding `documents`.
    pub fn with_documents(index: &str, documents: &[Document]) -> Self {
        let mock = Self::new();
        mock.lock().indices.entry(index.to_string()).or_default();
        for document in documents {
            // Document always serializes
            mock.insert_source(index, serde_json::to_value(document).unwrap_or(Value::Null));
        }
        mock
    }

    /// Store a raw `_source`, bypassing validation (for malformed documents).
    pub fn insert_source(&self, index: &str, source: Value) {
        self.lock()
            .indices
            .entry(index.to_string())
            .or_default()
            .push(source);
    }

    /// Answer the `n`-th request (zero-based) with `outcome` instead.
    pub fn script(&self, n: usize, outcome: Result<TransportResponse, TransportError>) {
        self.lock().scripted.insert(n, outcome);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.lock().requests.clone()
    }

    /// Number of `_search` requests received.
    pub fn search_count(&self) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path.ends_with("/_search"))
            .count()
    }

    /// Sources currently stored in `index`.
    pub fn sources(&self, index: &str) -> Vec<Value> {
        self.lock().indices.get(index).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn error_response(status: u16, error_type: &str, reason: &str) -> TransportResponse {
    let body = json!({
        "error": { "type": error_type, "reason": reason },
        "status": status
    });
    TransportResponse::new(status, body.to_string())
}

fn sort_id(source: &Value) -> i64 {
    source.get("ID").and_then(Value::as_i64).unwrap_or(i64::MAX)
}

fn search(state: &MockState, index: &str, request: &TransportRequest) -> TransportResponse {
    let Some(sources) = state.indices.get(index) else {
        return error_response(404, "index_not_found_exception", "no such index");
    };

    let body: Value = match request.body.as_deref().map(serde_json::from_slice) {
        Some(Ok(body)) => body,
        _ => return error_response(400, "parsing_exception", "request body is required"),
    };

    let mut ordered: Vec<&Value> = sources.iter().collect();
    ordered.sort_by_key(|source| sort_id(source));

    let from: usize = request.param("from").and_then(|v| v.parse().ok()).unwrap_or(0);
    let size: usize = request.param("size").and_then(|v| v.parse().ok()).unwrap_or(10);

    let window: Vec<&Value> = match body.pointer("/search_after/0").and_then(Value::as_i64) {
        Some(after) => ordered
            .into_iter()
            .filter(|source| sort_id(source) > after)
            .take(size)
            .collect(),
        None => ordered.into_iter().skip(from).take(size).collect(),
    };

    let hits: Vec<Value> = window
        .into_iter()
        .enumerate()
        .map(|(n, source)| {
            json!({
                "_index": index,
                "_id": format!("mock-{n}"),
                "_score": null,
                "_source": source,
                "sort": [sort_id(source)]
            })
        })
        .collect();

    let response = json!({
        "took": 1,
        "timed_out": false,
        "hits": {
            "total": { "value": sources.len(), "relation": "eq" },
            "max_score": null,
            "hits": hits
        }
    });
    TransportResponse::new(200, response.to_string())
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut state = self.lock();
        let n = state.requests.len();
        state.requests.push(request.clone());

        if let Some(outcome) = state.scripted.remove(&n) {
            return outcome;
        }

        let path = request.path.trim_start_matches('/');
        let response = match (request.method, path.split_once('/')) {
            (Method::Put, None) => {
                if state.indices.contains_key(path) {
                    error_response(400, "resource_already_exists_exception", "index exists")
                } else {
                    state.indices.insert(path.to_string(), Vec::new());
                    TransportResponse::new(200, json!({ "acknowledged": true }).to_string())
                }
            }
            (Method::Post, Some((index, "_doc"))) => {
                match request.body.as_deref().map(serde_json::from_slice::<Value>) {
                    Some(Ok(source)) => {
                        let index = index.to_string();
                        state.indices.entry(index).or_default().push(source);
                        TransportResponse::new(201, json!({ "result": "created" }).to_string())
                    }
                    _ => error_response(400, "mapper_parsing_exception", "failed to parse"),
                }
            }
            (Method::Post, Some((index, "_search"))) => search(&state, index, &request),
            _ => error_response(405, "method_not_allowed", "unsupported request"),
        };

        Ok(response)
    }
}
