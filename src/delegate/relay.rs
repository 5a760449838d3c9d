//! Bridges transport callbacks onto the request's own task.
//!
//! Every callback and the final outcome go through one unbounded FIFO, so the
//! consumer sees them in the order the transport produced them, with the
//! outcome always last.

use crate::backend::{
    HeadersCallback, LoadingCallback, PendingRequest, ProgressCallback, TransportResult,
};
use crate::headers::Headers;
use crate::progress::ProgressInfo;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events relayed from a transport
#[derive(Debug)]
pub(crate) enum TransportEvent {
    Headers { headers: Headers, status: u16 },
    Loading,
    Progress(ProgressInfo),
    Completed(TransportResult),
}

/// Sending half, handed to transport callbacks on any thread
#[derive(Clone)]
pub(crate) struct CallbackRelay {
    sender: mpsc::UnboundedSender<TransportEvent>,
}

/// Receiving half, drained on the request's task
pub(crate) struct EventQueue {
    receiver: mpsc::UnboundedReceiver<TransportEvent>,
}

pub(crate) fn channel() -> (CallbackRelay, EventQueue) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (CallbackRelay { sender }, EventQueue { receiver })
}

impl CallbackRelay {
    pub(crate) fn headers_callback(&self) -> HeadersCallback {
        let sender = self.sender.clone();
        Arc::new(move |headers, status| {
            // receiver gone means the request was reopened or dropped
            let _ = sender.send(TransportEvent::Headers { headers, status });
        })
    }

    pub(crate) fn loading_callback(&self) -> LoadingCallback {
        let sender = self.sender.clone();
        Arc::new(move || {
            let _ = sender.send(TransportEvent::Loading);
        })
    }

    pub(crate) fn progress_callback(&self) -> ProgressCallback {
        let sender = self.sender.clone();
        Arc::new(move |progress| {
            let _ = sender.send(TransportEvent::Progress(progress));
        })
    }

    /// Poll the request on the runtime's workers and relay its outcome.
    pub(crate) fn forward(self, pending: PendingRequest) -> JoinHandle<()> {
        tokio::spawn(async move {
            let outcome = pending.await;
            if self.sender.send(TransportEvent::Completed(outcome)).is_err() {
                tracing::trace!("request outcome dropped; receiver closed");
            }
        })
    }
}

impl EventQueue {
    /// Next relayed event, or `None` once every sender is gone
    pub(crate) async fn next(&mut self) -> Option<TransportEvent> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HttpResponse;
    use crate::error::{FailureKind, HttpFailure};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_foreign_thread_callbacks_keep_order() {
        let (relay, mut queue) = channel();
        let on_headers = relay.headers_callback();
        let on_loading = relay.loading_callback();
        let on_progress = relay.progress_callback();

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let pending = PendingRequest::new(async move {
            let _ = done_rx.await;
            Ok(HttpResponse::new("http://a/", 200, "ok"))
        });
        let forwarded = relay.forward(pending);

        std::thread::spawn(move || {
            on_headers(Headers::new(), 200);
            on_loading();
            for n in 1..=3 {
                on_progress(ProgressInfo::new(n, Some(3)));
            }
            let _ = done_tx.send(());
        })
        .join()
        .unwrap();

        let mut seen = Vec::new();
        while let Some(event) = queue.next().await {
            let last = matches!(event, TransportEvent::Completed(_));
            seen.push(match event {
                TransportEvent::Headers { status, .. } => format!("headers {}", status),
                TransportEvent::Loading => "loading".to_string(),
                TransportEvent::Progress(p) => format!("progress {}", p.bytes_transferred),
                TransportEvent::Completed(result) => {
                    format!("completed {}", result.unwrap().status_code)
                }
            });
            if last {
                break;
            }
        }
        forwarded.await.unwrap();

        assert_eq!(
            seen,
            vec![
                "headers 200",
                "loading",
                "progress 1",
                "progress 2",
                "progress 3",
                "completed 200"
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_outcome_is_relayed() {
        let (relay, mut queue) = channel();
        let pending = PendingRequest::new(std::future::pending());
        let handle = pending.cancel_handle();
        relay.forward(pending);
        handle.cancel();

        match queue.next().await {
            Some(TransportEvent::Completed(Err(HttpFailure { kind, .. }))) => {
                assert_eq!(kind, FailureKind::Cancelled)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_queue_closes_with_senders() {
        let (relay, mut queue) = channel();
        drop(relay);
        assert!(queue.next().await.is_none());
    }
}
