//! Reqwest backend for cross-platform HTTP support

use crate::backend::types::{HttpRequestOptions, HttpResponse, Payload};
use crate::backend::{BackendConfig, PendingRequest, Transport, TransportResult};
use crate::error::HttpFailure;
use crate::headers::Headers;
use crate::progress::ProgressInfo;
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

/// Upload bodies are handed to reqwest in chunks of this size so progress can
/// be reported while the body drains.
const UPLOAD_CHUNK: usize = 16 * 1024;

/// Reqwest backend for cross-platform HTTP
#[derive(Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new Reqwest backend
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create reqwest client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a new Reqwest backend with configuration
    pub fn with_config(config: BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if let Some(ignore_certs) = config.ignore_certificate_errors {
            builder = builder.danger_accept_invalid_certs(ignore_certs);
        }

        if let Some(default_headers) = config.default_headers {
            builder = builder.default_headers(default_headers.to_header_map()?);
        }

        if let Some(use_cookies) = config.use_cookies {
            builder = builder.cookie_store(use_cookies);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create reqwest client: {}", e)))?;

        Ok(Self { client })
    }

    /// Get the underlying reqwest client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Transport for ReqwestBackend {
    fn execute(&self, options: HttpRequestOptions) -> PendingRequest {
        let client = self.client.clone();
        PendingRequest::new(perform(client, options))
    }
}

async fn perform(client: reqwest::Client, options: HttpRequestOptions) -> TransportResult {
    let headers = options
        .headers
        .to_header_map()
        .map_err(|e| HttpFailure::error(e.to_string()))?;

    let mut req_builder = client
        .request(options.method.clone(), options.url.clone())
        .headers(headers);

    if let Some(timeout) = options.timeout {
        req_builder = req_builder.timeout(timeout);
    }

    // Body-carrying methods report the upload; others the download.
    let reports_download = !options.has_body_method();
    let mut reports_upload = false;
    if let Some(body) = options.content.as_ref().filter(|body| !body.is_empty()) {
        let content = body
            .to_bytes()
            .map_err(|e| HttpFailure::error(e.to_string()))?;
        reports_upload = true;
        req_builder = req_builder
            .header(http::header::CONTENT_LENGTH, content.len())
            .body(upload_body(content, &options));
    }

    tracing::debug!(method = %options.method, url = %options.url, "sending request");
    let response = req_builder.send().await.map_err(map_error)?;

    let status = response.status().as_u16();
    let url = response.url().to_string();
    let headers = Headers::from_header_map(response.headers());
    let total = response.content_length();
    tracing::debug!(status, url = %url, "received response headers");
    options.emit_headers(headers.clone(), status);

    let mut received = BytesMut::new();
    let mut loading_sent = false;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_error)?;
        received.extend_from_slice(&chunk);
        if reports_upload {
            continue;
        }
        if !loading_sent {
            loading_sent = true;
            options.emit_loading();
        }
        if reports_download {
            options.emit_progress(ProgressInfo::new(received.len() as u64, total));
        }
    }

    tracing::trace!(bytes = received.len(), "response body complete");

    Ok(HttpResponse {
        url,
        status_code: status,
        content: Payload::Bytes(received.freeze()),
        headers,
        response_text: None,
    })
}

fn upload_body(content: Bytes, options: &HttpRequestOptions) -> reqwest::Body {
    let total = content.len() as u64;
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(UPLOAD_CHUNK)
        .map(|start| content.slice(start..content.len().min(start + UPLOAD_CHUNK)))
        .collect();

    let on_loading = options.on_loading.clone();
    let on_progress = options.on_progress.clone();
    let mut sent = 0u64;

    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        if sent == 0 {
            if let Some(callback) = &on_loading {
                callback();
            }
        }
        sent += chunk.len() as u64;
        if let Some(callback) = &on_progress {
            callback(ProgressInfo::new(sent, Some(total)));
        }
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}

fn map_error(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::timeout()
    } else {
        HttpFailure::error(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_with_config() {
        let mut defaults = Headers::new();
        defaults.append("X-Client", "xhr-bridge");

        let backend = ReqwestBackend::with_config(BackendConfig {
            timeout: Some(Duration::from_secs(5)),
            user_agent: Some("xhr-bridge-test".into()),
            ignore_certificate_errors: Some(false),
            default_headers: Some(defaults),
            use_cookies: Some(true),
        });
        assert!(backend.is_ok());
    }

    #[test]
    fn test_invalid_default_header_rejected() {
        let mut defaults = Headers::new();
        defaults.append("bad header", "x");

        let result = ReqwestBackend::with_config(BackendConfig {
            default_headers: Some(defaults),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidHeader { .. })));
    }
}
