//! Scripted transport
//!
//! Replays a fixed sequence of native-style callbacks from whatever runtime
//! worker polls the request, the way platform transports call back from their
//! own queues. Useful for tests and for driving a request object without a
//! network.

use crate::backend::types::{HttpRequestOptions, HttpResponse};
use crate::backend::{PendingRequest, Transport};
use crate::body::Body;
use crate::error::HttpFailure;
use crate::headers::Headers;
use crate::progress::ProgressInfo;
use http::Method;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One scripted transport action
#[derive(Debug, Clone)]
pub enum Step {
    /// Report response headers
    Headers {
        /// Status code
        status: u16,
        /// Response headers
        headers: Headers,
    },
    /// Report that body bytes started moving
    Loading,
    /// Report transfer progress
    Progress(ProgressInfo),
    /// Wait before the next step
    Delay(Duration),
    /// Resolve the request
    Respond(HttpResponse),
    /// Reject the request
    Fail(HttpFailure),
    /// Never finish; only a timeout or cancellation ends the request
    Stall,
}

/// What a request looked like when it reached the transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Method
    pub method: Method,
    /// URL
    pub url: String,
    /// Outgoing headers
    pub headers: Headers,
    /// Outgoing body
    pub content: Option<Body>,
    /// Time budget
    pub timeout: Option<Duration>,
    /// Whether a progress callback was registered
    pub wants_progress: bool,
}

/// Transport that replays a script for every request
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    steps: Arc<Vec<Step>>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedTransport {
    /// Replay `steps` for every request
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(steps),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Headers, loading, one full progress report, then `response`
    pub fn completing_with(response: HttpResponse) -> Self {
        let length = match &response.content {
            crate::backend::Payload::Bytes(bytes) => bytes.len() as u64,
            crate::backend::Payload::Text(text) => text.len() as u64,
            crate::backend::Payload::Json(value) => value.to_string().len() as u64,
        };
        Self::new(vec![
            Step::Headers {
                status: response.status_code,
                headers: response.headers.clone(),
            },
            Step::Loading,
            Step::Progress(ProgressInfo::new(length, Some(length))),
            Step::Respond(response),
        ])
    }

    /// A request that never completes on its own
    pub fn stalled() -> Self {
        Self::new(vec![Step::Stall])
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().pop()
    }

    fn record(&self, options: &HttpRequestOptions) {
        let request = RecordedRequest {
            method: options.method.clone(),
            url: options.url.to_string(),
            headers: options.headers.clone(),
            content: options.content.clone(),
            timeout: options.timeout,
            wants_progress: options.on_progress.is_some(),
        };
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, options: HttpRequestOptions) -> PendingRequest {
        self.record(&options);
        tracing::debug!(method = %options.method, url = %options.url, "scripted request");

        let steps = self.steps.clone();
        let timeout = options.timeout;
        let run = async move {
            for step in steps.iter() {
                // give the runtime a chance to move us to another worker
                tokio::task::yield_now().await;
                match step {
                    Step::Headers { status, headers } => {
                        options.emit_headers(headers.clone(), *status)
                    }
                    Step::Loading => options.emit_loading(),
                    Step::Progress(progress) => options.emit_progress(*progress),
                    Step::Delay(duration) => tokio::time::sleep(*duration).await,
                    Step::Respond(response) => return Ok(response.clone()),
                    Step::Fail(failure) => return Err(failure.clone()),
                    Step::Stall => std::future::pending::<()>().await,
                }
            }
            Err(HttpFailure::error("script ended without a response"))
        };

        match timeout {
            Some(budget) => PendingRequest::new(async move {
                tokio::time::timeout(budget, run)
                    .await
                    .unwrap_or_else(|_| Err(HttpFailure::timeout()))
            }),
            None => PendingRequest::new(run),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use url::Url;

    fn options(url: &str) -> HttpRequestOptions {
        HttpRequestOptions::new(Method::GET, Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_callbacks_run_in_script_order() {
        let transport = ScriptedTransport::completing_with(
            HttpResponse::new("http://example.test/", 200, "abc").with_header("X-A", "1"),
        );
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut opts = options("http://example.test/");
        let log = seen.clone();
        opts.on_headers = Some(Arc::new(move |_: Headers, status: u16| {
            log.lock().unwrap().push(format!("headers {}", status))
        }));
        let log = seen.clone();
        opts.on_loading = Some(Arc::new(move || log.lock().unwrap().push("loading".into())));
        let log = seen.clone();
        opts.on_progress = Some(Arc::new(move |p: ProgressInfo| {
            log.lock()
                .unwrap()
                .push(format!("progress {}", p.bytes_transferred))
        }));

        let response = transport.execute(opts).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["headers 200", "loading", "progress 3"]
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_budget() {
        let transport = ScriptedTransport::stalled();
        let mut opts = options("http://example.test/slow");
        opts.timeout = Some(Duration::from_millis(20));

        let failure = transport.execute(opts).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(
            transport.last_request().unwrap().timeout,
            Some(Duration::from_millis(20))
        );
    }

    #[tokio::test]
    async fn test_script_without_outcome_fails() {
        let transport = ScriptedTransport::new(vec![Step::Loading]);
        let failure = transport
            .execute(options("http://example.test/"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Error);
    }
}
