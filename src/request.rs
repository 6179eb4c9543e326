//! HTTP transport used by [`FileResource`](crate::file::FileResource).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Base URL of the service's REST API.
pub const DEFAULT_API_BASE: &str = "https://open.ge.tt/1";

/// A response whose body has been parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a string field in the parsed body.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.body.as_ref()?.get(name)?.as_str()
    }
}

/// A response whose body is kept as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_line: String,
    pub success: bool,
    pub body: Vec<u8>,
}

/// Performs requests against the service.
///
/// `path` arguments are relative to the client's base URL; `put` takes an
/// absolute URL because upload endpoints are handed out by the service.
/// Transport failures are returned as errors. A non-2xx reply is *not* an
/// error at this level: callers decide what a failed status means.
#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse>;

    async fn post(&self, path: &str) -> Result<ApiResponse>;

    async fn put(&self, url: &str, content: Vec<u8>) -> Result<ApiResponse>;

    async fn get_raw(&self, path: &str) -> Result<RawResponse>;
}

/// [`RequestClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRequestClient {
    base_url: String,
    http: Client,
}

impl HttpRequestClient {
    /// Create a client for the default API base.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Create a client for a custom API base (trailing slashes are ignored).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut client = Self::with_base_url(base_url);
        client.http = Client::builder().timeout(timeout).build()?;
        Ok(client)
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse(response: Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        Ok(ApiResponse { status, body })
    }
}

impl Default for HttpRequestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a status as `"404 Not Found"`.
pub fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[async_trait]
impl RequestClient for HttpRequestClient {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        debug!(method = "GET", path = %redact(path), "Sending request");
        let response = self.http.get(self.endpoint(path)).send().await?;
        Self::parse(response).await
    }

    async fn post(&self, path: &str) -> Result<ApiResponse> {
        debug!(method = "POST", path = %redact(path), "Sending request");
        let response = self.http.post(self.endpoint(path)).send().await?;
        Self::parse(response).await
    }

    async fn put(&self, url: &str, content: Vec<u8>) -> Result<ApiResponse> {
        debug!(method = "PUT", bytes = content.len(), "Sending upload");
        let response = self
            .http
            .put(url)
            .header("Content-Length", content.len().to_string())
            .body(content)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get_raw(&self, path: &str) -> Result<RawResponse> {
        debug!(method = "GET", path = %redact(path), "Fetching raw body");
        let response = self.http.get(self.endpoint(path)).send().await?;
        let status = response.status();

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }

        Ok(RawResponse {
            status_line: status_line(status),
            success: status.is_success(),
            body,
        })
    }
}

/// Strip the query string so access tokens never reach the logs.
fn redact(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}
