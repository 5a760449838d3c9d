//! Shared types between backend implementations

use crate::body::Body;
use crate::headers::Headers;
use crate::progress::ProgressInfo;
use bytes::Bytes;
use http::Method;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Callback for response headers: `(headers, status_code)`
pub type HeadersCallback = Arc<dyn Fn(Headers, u16) + Send + Sync + 'static>;

/// Callback fired once when body bytes first move
pub type LoadingCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Callback type for progress reporting
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync + 'static>;

/// Platform-agnostic HTTP request handed to a transport.
///
/// Transports may invoke the callbacks from any thread.
pub struct HttpRequestOptions {
    /// HTTP method for the request
    pub method: Method,
    /// URL for the request
    pub url: Url,
    /// Headers for the request
    pub headers: Headers,
    /// Optional body content
    pub content: Option<Body>,
    /// Wall-clock budget for the whole exchange
    pub timeout: Option<Duration>,
    /// Body transfer progress
    pub on_progress: Option<ProgressCallback>,
    /// Response headers became available
    pub on_headers: Option<HeadersCallback>,
    /// First body byte moved
    pub on_loading: Option<LoadingCallback>,
}

impl HttpRequestOptions {
    /// Create options without headers, body or callbacks
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            content: None,
            timeout: None,
            on_progress: None,
            on_headers: None,
            on_loading: None,
        }
    }

    /// Invoke `on_headers` if registered
    pub fn emit_headers(&self, headers: Headers, status: u16) {
        if let Some(callback) = &self.on_headers {
            callback(headers, status);
        }
    }

    /// Invoke `on_loading` if registered
    pub fn emit_loading(&self) {
        if let Some(callback) = &self.on_loading {
            callback();
        }
    }

    /// Invoke `on_progress` if registered
    pub fn emit_progress(&self, progress: ProgressInfo) {
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }

    /// Whether the method carries a request body
    pub fn has_body_method(&self) -> bool {
        method_carries_body(&self.method)
    }
}

impl std::fmt::Debug for HttpRequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequestOptions")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("content", &self.content)
            .field("timeout", &self.timeout)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_headers", &self.on_headers.is_some())
            .field("on_loading", &self.on_loading.is_some())
            .finish()
    }
}

/// Methods whose request body is transferred and reported on the upload channel
pub(crate) fn method_carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT
}

/// Body as delivered by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes, not yet decoded
    Bytes(Bytes),
    /// Text the transport already decoded
    Text(String),
    /// JSON the transport already parsed
    Json(serde_json::Value),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Bytes(Bytes::new())
    }
}

/// Platform-agnostic HTTP response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Response body
    pub content: Payload,
    /// Response headers
    pub headers: Headers,
    /// Text rendering supplied by the transport, if it decoded the body itself
    pub response_text: Option<String>,
}

impl HttpResponse {
    /// Create a response with a raw body
    pub fn new(url: impl Into<String>, status_code: u16, content: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status_code,
            content: Payload::Bytes(content.into()),
            headers: Headers::new(),
            response_text: None,
        }
    }

    /// Add a response header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the body
    pub fn with_payload(mut self, content: Payload) -> Self {
        self.content = content;
        self
    }
}
