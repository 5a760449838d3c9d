//! Backend abstraction for HTTP transports
//!
//! A transport performs one network exchange per [`Transport::execute`] call
//! and reports it through the callbacks in [`HttpRequestOptions`] and the
//! returned [`PendingRequest`]. During a successful exchange it must call, in
//! order: `on_headers` once, `on_loading` once the first body byte moves,
//! `on_progress` any number of times with non-decreasing `bytes_transferred`,
//! and finally resolve the future. Callbacks and completion may happen on any
//! thread; the request object marshals them back onto its own context.

pub mod pending;
pub mod scripted;
pub mod types;

#[cfg(feature = "backend-reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "backend-reqwest")))]
pub mod reqwest;

pub use pending::{CancelHandle, PendingRequest, TransportResult};
pub use types::{
    HeadersCallback, HttpRequestOptions, HttpResponse, LoadingCallback, Payload,
    ProgressCallback,
};

use crate::Result;
use crate::headers::Headers;
use std::sync::Arc;
use std::time::Duration;

/// Asynchronous request executor plugged in underneath a request object
pub trait Transport: Send + Sync {
    /// Start the exchange described by `options`
    fn execute(&self, options: HttpRequestOptions) -> PendingRequest;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, options: HttpRequestOptions) -> PendingRequest {
        (**self).execute(options)
    }
}

/// Configuration for backend creation
#[derive(Clone, Debug, Default)]
pub struct BackendConfig {
    /// Request timeout applied when a request sets none
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Whether to ignore certificate errors
    pub ignore_certificate_errors: Option<bool>,
    /// Default headers to add to all requests
    pub default_headers: Option<Headers>,
    /// Enable or disable cookies
    pub use_cookies: Option<bool>,
}

/// HTTP transport implementations
#[derive(Clone)]
pub enum Backend {
    /// Cross-platform implementation using reqwest
    #[cfg(feature = "backend-reqwest")]
    Reqwest(reqwest::ReqwestBackend),

    /// Caller-supplied transport, typically a native platform binding
    Custom(Arc<dyn Transport>),
}

impl Backend {
    /// Auto-select best backend for platform
    pub fn default_for_platform() -> Result<Self> {
        #[cfg(feature = "backend-reqwest")]
        {
            Ok(Backend::Reqwest(reqwest::ReqwestBackend::new()?))
        }

        #[cfg(not(feature = "backend-reqwest"))]
        {
            Err(crate::Error::Internal(
                "No built-in transport enabled; supply one with Backend::custom".to_string(),
            ))
        }
    }

    /// Explicitly use reqwest backend (works on all platforms)
    #[cfg(feature = "backend-reqwest")]
    pub fn reqwest() -> Result<Self> {
        Ok(Backend::Reqwest(reqwest::ReqwestBackend::new()?))
    }

    /// Use reqwest backend with configuration
    #[cfg(feature = "backend-reqwest")]
    pub fn reqwest_with_config(config: BackendConfig) -> Result<Self> {
        Ok(Backend::Reqwest(reqwest::ReqwestBackend::with_config(
            config,
        )?))
    }

    /// Wrap any transport
    pub fn custom(transport: impl Transport + 'static) -> Self {
        Backend::Custom(Arc::new(transport))
    }
}

impl Transport for Backend {
    fn execute(&self, options: HttpRequestOptions) -> PendingRequest {
        match self {
            #[cfg(feature = "backend-reqwest")]
            Backend::Reqwest(r) => r.execute(options),

            Backend::Custom(transport) => transport.execute(options),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "backend-reqwest")]
            Backend::Reqwest(_) => f.write_str("Backend::Reqwest"),
            Backend::Custom(_) => f.write_str("Backend::Custom"),
        }
    }
}
