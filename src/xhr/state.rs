//! Request object state

use crate::auth::Credentials;
use crate::backend::CancelHandle;
use crate::error::HttpFailure;
use crate::headers::Headers;
use crate::negotiate::{ResponseBody, ResponseType};
use crate::progress::ProgressInfo;
use http::Method;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Lifecycle stage of a request object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// `open` has not been called
    #[default]
    Unsent = 0,
    /// `open` succeeded
    Opened = 1,
    /// Status and headers are available
    HeadersReceived = 2,
    /// Body is transferring
    Loading = 3,
    /// The exchange finished, successfully or not
    Done = 4,
}

impl ReadyState {
    /// Numeric value, 0 through 4
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper-case constant name
    pub fn name(self) -> &'static str {
        match self {
            ReadyState::Unsent => "UNSENT",
            ReadyState::Opened => "OPENED",
            ReadyState::HeadersReceived => "HEADERS_RECEIVED",
            ReadyState::Loading => "LOADING",
            ReadyState::Done => "DONE",
        }
    }
}

impl From<ReadyState> for u8 {
    fn from(state: ReadyState) -> u8 {
        state.as_u8()
    }
}

impl TryFrom<u8> for ReadyState {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(ReadyState::Unsent),
            1 => Ok(ReadyState::Opened),
            2 => Ok(ReadyState::HeadersReceived),
            3 => Ok(ReadyState::Loading),
            4 => Ok(ReadyState::Done),
            other => Err(other),
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What `open` recorded
#[derive(Debug, Clone)]
pub(crate) struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub asynchronous: bool,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ResponseBuffer {
    pub status: u16,
    pub headers: Headers,
    pub body: ResponseBody,
    pub text: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug)]
pub(crate) struct InFlight {
    pub cancel: CancelHandle,
}

/// Mutable state behind a request object. Only touched from its own task.
#[derive(Debug, Default)]
pub(crate) struct RequestState {
    pub ready_state: ReadyState,
    pub request: Option<RequestDescriptor>,
    pub request_headers: Headers,
    pub response: ResponseBuffer,
    pub response_type: ResponseType,
    pub mime_override: Option<String>,
    pub timeout: Option<Duration>,
    pub with_credentials: bool,

    /// Set from `send` until the outcome is applied
    pub in_flight: Option<InFlight>,
    /// Bumped by every `open`; events tagged with an older value are dropped
    pub generation: u64,

    /// Whether the current send reports on the upload channel
    pub upload_active: bool,
    /// Outgoing body length, used for `loadstart` before headers arrive
    pub request_length: Option<u64>,
    pub last_progress: ProgressInfo,
    pub headers_seen: bool,
    pub loading_seen: bool,
    pub failure: Option<HttpFailure>,
}

impl RequestState {
    /// Clear everything a new `open` must not inherit
    pub fn reset_for_open(&mut self, request: RequestDescriptor) {
        self.generation += 1;
        self.request = Some(request);
        self.request_headers = Headers::new();
        self.response = ResponseBuffer::default();
        self.in_flight = None;
        self.upload_active = false;
        self.request_length = None;
        self.last_progress = ProgressInfo::default();
        self.headers_seen = false;
        self.loading_seen = false;
        self.failure = None;
        self.ready_state = ReadyState::Opened;
    }

    /// Whether `send` was called and its outcome is still pending
    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// `OPENED` with no send pending
    pub fn accepts_configuration(&self) -> bool {
        self.ready_state == ReadyState::Opened && !self.is_sending()
    }

    /// Merge a transport progress report, keeping `loaded` non-decreasing
    pub fn merge_progress(&mut self, progress: ProgressInfo) -> ProgressInfo {
        let merged = ProgressInfo {
            bytes_transferred: progress
                .bytes_transferred
                .max(self.last_progress.bytes_transferred),
            total_bytes: progress.total_bytes.or(self.last_progress.total_bytes),
        };
        self.last_progress = merged;
        merged
    }
}
