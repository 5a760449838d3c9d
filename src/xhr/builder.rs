//! Builder for request objects

use super::{Defaults, XmlHttpRequest};
use crate::Result;
use crate::backend::{Backend, BackendConfig, Transport};
use crate::headers::Headers;
use crate::negotiate::ResponseType;
use std::time::Duration;

/// Configures a [`XmlHttpRequest`] before creation
#[derive(Debug, Default)]
pub struct XmlHttpRequestBuilder {
    backend: Option<Backend>,
    config: BackendConfig,
    defaults: Defaults,
    response_type: ResponseType,
}

impl XmlHttpRequestBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific backend instead of the platform default
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a custom transport
    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.backend(Backend::custom(transport))
    }

    /// Timeout for requests that do not set their own
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.defaults.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent unless the request sets the same name
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.headers.append(name, value);
        self
    }

    /// Replace all default headers
    pub fn default_headers(mut self, headers: Headers) -> Self {
        self.defaults.headers = headers;
        self
    }

    /// Initial response type
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Enable or disable cookies on the built-in backend
    pub fn use_cookies(mut self, use_cookies: bool) -> Self {
        self.config.use_cookies = Some(use_cookies);
        self
    }

    /// Ignore certificate errors on the built-in backend (for testing only)
    pub fn ignore_certificate_errors(mut self, ignore: bool) -> Self {
        self.config.ignore_certificate_errors = Some(ignore);
        self
    }

    /// Build the request object
    pub fn build(self) -> Result<XmlHttpRequest> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(self.config)?,
        };
        Ok(XmlHttpRequest::from_parts(
            backend,
            self.defaults,
            self.response_type,
        ))
    }
}

#[cfg(feature = "backend-reqwest")]
fn default_backend(config: BackendConfig) -> Result<Backend> {
    Backend::reqwest_with_config(config)
}

#[cfg(not(feature = "backend-reqwest"))]
fn default_backend(_config: BackendConfig) -> Result<Backend> {
    Backend::default_for_platform()
}
