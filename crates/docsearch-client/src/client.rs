//! Search client: the single entry point callers hold.
//!
//! A `SearchClient` is built once by the composition root and passed by
//! reference to everything that talks to the engine. It keeps no state between
//! calls beyond the shared transport.

use std::path::Path;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use docsearch_types::{Cursor, Document, Page, Settings};

use crate::decode::decode_page;
use crate::error::ClientError;
use crate::invoker::{engine_error, execute_search, send_cancellable, SearchOptions};
use crate::query::build_query;
use crate::transport::{HttpTransport, HttpTransportConfig, Method, Transport, TransportRequest};

/// Client-side settings that shape every call.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Index used when a call passes an empty name
    pub default_index: String,
    /// Search timeout and total-hits tracking
    pub search: SearchOptions,
}

impl ClientConfig {
    pub fn new(default_index: impl Into<String>) -> Self {
        Self {
            default_index: default_index.into(),
            search: SearchOptions::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            default_index: settings.default_index.clone(),
            search: SearchOptions {
                timeout: settings.query_timeout(),
                track_total_hits: settings.track_total_hits,
            },
        }
    }
}

/// Client for indexing and paging through documents.
pub struct SearchClient<T = HttpTransport> {
    transport: T,
    config: ClientConfig,
}

impl SearchClient<HttpTransport> {
    /// Build an HTTP-backed client from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(HttpTransportConfig::from_settings(settings))?;
        info!(hosts = ?settings.hosts, default_index = %settings.default_index, "Created search client");
        Ok(Self::new(transport, ClientConfig::from_settings(settings)))
    }
}

impl<T: Transport> SearchClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn default_index(&self) -> &str {
        &self.config.default_index
    }

    /// Resolve an index name, falling back to the default for empty input.
    pub fn resolve_index<'a>(&'a self, index: &'a str) -> &'a str {
        if index.is_empty() {
            &self.config.default_index
        } else {
            index
        }
    }

    /// Create `index` using the mapping schema stored at `mapping_path`.
    pub async fn create_index(
        &self,
        index: &str,
        mapping_path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        let index = self.resolve_index(index);
        let mapping_path = mapping_path.as_ref();

        let mapping = tokio::fs::read(mapping_path)
            .await
            .map_err(|source| ClientError::Mapping {
                path: mapping_path.display().to_string(),
                source,
            })?;

        let request = TransportRequest::new(Method::Put, index).with_body(mapping);
        let response = send_cancellable(&self.transport, request, cancel).await?;

        if !response.is_success() {
            error!(index = %index, status = response.status, "Failed to create index");
            return Err(engine_error(index, response.status, &response.body));
        }

        info!(index = %index, mapping = %mapping_path.display(), "Created index");
        Ok(())
    }

    /// Store one document; the engine assigns its id and refreshes the index
    /// so the document is visible to the next search.
    pub async fn store(
        &self,
        index: &str,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        let index = self.resolve_index(index);
        let body = document.to_json()?;

        let request = TransportRequest::new(Method::Post, format!("{}/_doc", index))
            .with_param("refresh", "true")
            .with_body(body);
        let response = send_cancellable(&self.transport, request, cancel).await?;

        if !response.is_success() {
            error!(index = %index, id = document.id, status = response.status, "Failed to store document");
            return Err(engine_error(index, response.status, &response.body));
        }

        debug!(index = %index, id = document.id, status = response.status, "Stored document");
        Ok(())
    }

    /// Store `count` generated documents with ids `0..count`.
    ///
    /// Stops at the first failure. Returns the number of documents stored.
    pub async fn seed(
        &self,
        index: &str,
        count: usize,
        created_at: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<usize, ClientError> {
        let index = self.resolve_index(index);

        for i in 0..count {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let document = Document::new(i as i64, created_at, format!("user {}", i));
            if let Err(e) = self.store(index, &document, cancel).await {
                error!(index = %index, id = i, error = %e, "Seeding stopped");
                return Err(e);
            }
        }

        info!(index = %index, count, "Seeded documents");
        Ok(count)
    }

    /// Fetch one page.
    ///
    /// Without a cursor the page starts at `from`; with a cursor it continues
    /// right after the cursor's hit and `from` is ignored.
    pub async fn load(
        &self,
        index: &str,
        from: usize,
        size: usize,
        cursor: Option<&Cursor>,
        cancel: &CancellationToken,
    ) -> Result<Page, ClientError> {
        let index = self.resolve_index(index);
        let query = build_query(from, size, cursor);

        debug!(
            index = %index,
            from = ?query.from(),
            size,
            cursor = ?cursor.map(ToString::to_string),
            "Loading page"
        );

        let body = execute_search(&self.transport, index, &query, self.config.search, cancel).await?;
        decode_page(&body).map_err(|source| {
            error!(index = %index, error = %source, "Malformed search response");
            ClientError::Envelope {
                index: index.to_string(),
                source,
            }
        })
    }
}
