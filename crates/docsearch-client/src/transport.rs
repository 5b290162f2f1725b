//! Transport seam between the client and the search engine.
//!
//! `Transport` is the only place a request leaves the process. The HTTP
//! implementation owns connection handling, authentication and retries; the
//! rest of the crate sees one `send` per logical request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, warn};

use docsearch_types::Settings;

use crate::error::TransportError;

/// HTTP method of a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// A request to the engine, relative to whichever host serves it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Path without host, e.g. `users/_search`
    pub path: String,
    /// Query string parameters, in order
    pub params: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a query parameter by name.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw engine response: status plus body bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the engine.
///
/// Implementations must be safe to share across concurrent retrievals.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URLs, used round-robin
    pub hosts: Vec<String>,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<SecretString>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Send `Accept-Encoding: identity`
    pub disable_compression: bool,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// First backoff interval between retries
    pub initial_backoff: Duration,
}

impl HttpTransportConfig {
    /// Config for a single host with default timeouts.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            hosts: vec![host.into()],
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            disable_compression: true,
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            hosts: settings.hosts.clone(),
            username: settings.username.clone(),
            password: settings.password.clone().map(SecretString::from),
            timeout: settings.query_timeout(),
            connect_timeout: settings.connect_timeout(),
            disable_compression: settings.disable_compression,
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(100),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }
}

/// Statuses worth another attempt: the engine or a proxy in front of it is
/// temporarily unavailable.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 502..=504)
}

/// `Transport` over HTTP using reqwest.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    next_host: AtomicUsize,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        if config.hosts.is_empty() {
            return Err(TransportError::InvalidRequest(
                "at least one host is required".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if config.disable_compression {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        debug!(hosts = ?config.hosts, "Created HTTP transport");

        Ok(Self {
            client,
            config,
            next_host: AtomicUsize::new(0),
        })
    }

    fn next_url(&self, path: &str) -> String {
        let slot = self.next_host.fetch_add(1, Ordering::Relaxed) % self.config.hosts.len();
        let host = self.config.hosts[slot].trim_end_matches('/');
        format!("{}/{}", host, path.trim_start_matches('/'))
    }

    /// Backoff schedule for one logical request, bounded by the time every
    /// attempt would take to time out.
    fn retry_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_elapsed_time: self
                .config
                .timeout
                .checked_mul(self.config.max_retries.saturating_add(1)),
            ..Default::default()
        }
    }

    /// Make a single HTTP request.
    async fn send_once(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.next_url(&request.path);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .query(&request.params);

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        if let Some(username) = &self.config.username {
            builder = builder.basic_auth(
                username,
                self.config.password.as_ref().map(|p| p.expose_secret()),
            );
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        debug!(url = %url, status, bytes = body.len(), "Engine responded");

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut backoff = self.retry_backoff();

        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let outcome = self.send_once(&request).await;

            let retry_reason = match &outcome {
                Ok(response) if is_retryable_status(response.status) => {
                    Some(format!("status {}", response.status))
                }
                Err(TransportError::Connection(e)) => Some(e.clone()),
                _ => None,
            };
            let Some(retry_reason) = retry_reason else {
                return outcome;
            };

            if attempts > self.config.max_retries {
                error!(path = %request.path, attempts, reason = %retry_reason, "Max retries exceeded");
                return outcome;
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    warn!(
                        path = %request.path,
                        reason = %retry_reason,
                        retry_in_ms = duration.as_millis(),
                        "Engine request failed, retrying"
                    );
                    tokio::time::sleep(duration).await;
                }
                None => {
                    error!(path = %request.path, reason = %retry_reason, "Backoff exhausted");
                    return outcome;
                }
            }
        }
    }
}
