//! Cancellable transport futures

use crate::backend::types::HttpResponse;
use crate::error::HttpFailure;
use futures_util::future::{AbortHandle, Abortable, BoxFuture, FutureExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outcome of a transport exchange
pub type TransportResult = std::result::Result<HttpResponse, HttpFailure>;

/// In-flight transport exchange.
///
/// Resolves to the response or a typed failure. After [`cancel`] the future
/// resolves to a `Cancelled` failure on its next poll, unless it already
/// resolved.
///
/// [`cancel`]: PendingRequest::cancel
pub struct PendingRequest {
    future: Abortable<BoxFuture<'static, TransportResult>>,
    handle: CancelHandle,
}

impl PendingRequest {
    /// Wrap a transport future
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = TransportResult> + Send + 'static,
    {
        let (abort_handle, registration) = AbortHandle::new_pair();
        Self {
            future: Abortable::new(future.boxed(), registration),
            handle: CancelHandle(abort_handle),
        }
    }

    /// A request that fails without touching the network
    pub fn failed(failure: HttpFailure) -> Self {
        Self::new(async move { Err(failure) })
    }

    /// Handle that cancels this request from anywhere
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

impl Future for PendingRequest {
    type Output = TransportResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.future).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_aborted)) => Poll::Ready(Err(HttpFailure::cancelled())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("cancelled", &self.handle.is_cancelled())
            .finish()
    }
}

/// Cloneable cancellation handle. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    /// Request cancellation
    pub fn cancel(&self) {
        self.0.abort();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.is_aborted()
    }
}
