//! `XMLHttpRequest` semantics over pluggable asynchronous transports
//!
//! This crate reproduces the browser request object contract (the five-state
//! `readyState` machine, progress events, response decoding by content type,
//! cancellation and the upload channel) on top of any [`Transport`]. Native
//! transports may call back from arbitrary threads; every callback is marshalled
//! onto the request object's own task so listeners observe events in order.
//!
//! A reqwest-based transport is built in behind the default
//! `backend-reqwest` feature.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub use auth::Credentials;
pub use backend::scripted::{RecordedRequest, ScriptedTransport, Step};
pub use backend::{
    Backend, BackendConfig, CancelHandle, HttpRequestOptions, HttpResponse, Payload,
    PendingRequest, Transport, TransportResult,
};
pub use body::Body;
pub use error::{Error, FailureKind, HttpFailure, Result};
pub use events::{EventTarget, Listener, listener};
pub use headers::{HeaderValues, Headers};
pub use negotiate::{ResponseBody, ResponseKind, ResponseType};
pub use progress::{EventType, ProgressEvent, ProgressInfo};
pub use xhr::{
    ReadyState, ReadyStateHandler, XmlHttpRequest, XmlHttpRequestBuilder, XmlHttpRequestUpload,
};

mod auth;
pub mod backend;
mod body;
mod delegate;
mod error;
pub mod events;
mod headers;
pub mod negotiate;
mod progress;
mod xhr;
