//! Applies relayed transport events to a request object.
//!
//! Every step re-checks the generation before touching state or dispatching,
//! so a listener that calls `open` stops the rest of the old sequence.

use super::{Inner, ReadyState};
use crate::backend::HttpResponse;
use crate::delegate::{EventQueue, TransportEvent};
use crate::error::{FailureKind, HttpFailure};
use crate::headers::Headers;
use crate::negotiate::{
    ResponseBody, charset_of, classify_content_type, decode_body, select_preferred_type,
};
use crate::progress::{EventType, ProgressEvent, ProgressInfo};
use std::cell::RefMut;
use std::rc::Weak;

use super::state::RequestState;

/// Drain `queue` until the outcome of send number `generation` is applied.
pub(super) async fn drive(inner: Weak<Inner>, generation: u64, mut queue: EventQueue) {
    while let Some(event) = queue.next().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        if !inner.is_current(generation) {
            tracing::trace!(generation, "dropping events of a superseded request");
            return;
        }
        let completed = matches!(event, TransportEvent::Completed(_));
        inner.apply(generation, event);
        if completed {
            return;
        }
    }

    // every sender dropped without an outcome
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let orphaned = inner.is_current(generation) && inner.state.borrow().is_sending();
    if orphaned {
        tracing::warn!(generation, "transport finished without reporting an outcome");
        inner.apply(
            generation,
            TransportEvent::Completed(Err(HttpFailure::error(
                "transport finished without a response",
            ))),
        );
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.state.borrow().generation == generation
    }

    fn state_for(&self, generation: u64) -> Option<RefMut<'_, RequestState>> {
        let state = self.state.borrow_mut();
        (state.generation == generation).then_some(state)
    }

    fn apply(&self, generation: u64, event: TransportEvent) {
        let applied = match event {
            TransportEvent::Headers { headers, status } => {
                self.on_headers(generation, headers, status)
            }
            TransportEvent::Loading => self.on_loading(generation),
            TransportEvent::Progress(progress) => self.on_progress(generation, progress),
            TransportEvent::Completed(Ok(response)) => self.on_response(generation, response),
            TransportEvent::Completed(Err(failure)) => self.on_failure(generation, failure),
        };
        if applied.is_none() {
            tracing::trace!(generation, "request reopened by a listener mid-sequence");
        }
    }

    fn on_headers(&self, generation: u64, headers: Headers, status: u16) -> Option<()> {
        let loading_pending = {
            let mut state = self.state_for(generation)?;
            if state.headers_seen {
                tracing::trace!("ignoring repeated headers callback");
                return Some(());
            }
            state.headers_seen = true;
            state.response.status = status;
            state.response.headers = headers;
            state.loading_seen
        };

        self.transition(generation, ReadyState::HeadersReceived)?;
        if loading_pending {
            self.transition(generation, ReadyState::Loading)?;
        }
        Some(())
    }

    fn on_loading(&self, generation: u64) -> Option<()> {
        let (start, headers_seen) = {
            let mut state = self.state_for(generation)?;
            if state.loading_seen {
                tracing::trace!("ignoring repeated loading callback");
                return Some(());
            }
            state.loading_seen = true;
            let total = if state.headers_seen {
                state.response.headers.content_length()
            } else {
                state.request_length
            };
            (ProgressInfo::new(0, total), state.headers_seen)
        };

        self.emit(generation, EventType::LoadStart, start)?;
        // before headers, LOADING waits for HEADERS_RECEIVED
        if headers_seen {
            self.transition(generation, ReadyState::Loading)?;
        }
        Some(())
    }

    fn on_progress(&self, generation: u64, progress: ProgressInfo) -> Option<()> {
        if !self.state_for(generation)?.loading_seen {
            self.on_loading(generation)?;
        }
        let merged = self.state_for(generation)?.merge_progress(progress);
        if merged.bytes_transferred > 0 {
            self.emit(generation, EventType::Progress, merged)?;
        }
        Some(())
    }

    fn on_response(&self, generation: u64, response: HttpResponse) -> Option<()> {
        let (headers_seen, loading_seen) = {
            let mut state = self.state_for(generation)?;
            state.in_flight = None;
            (state.headers_seen, state.loading_seen)
        };
        if !headers_seen {
            self.on_headers(generation, response.headers.clone(), response.status_code)?;
        }
        if !loading_seen {
            self.on_loading(generation)?;
        }

        let progress = {
            let mut state = self.state_for(generation)?;
            let media_type = state
                .mime_override
                .clone()
                .or_else(|| {
                    state
                        .response
                        .headers
                        .get_first("Content-Type")
                        .map(str::to_string)
                })
                .or_else(|| state.request_headers.get_first("Accept").map(str::to_string));
            let selected = media_type.as_deref().map(select_preferred_type);
            let kind = classify_content_type(selected.as_deref(), state.response_type);
            let charset = selected.as_deref().and_then(charset_of);

            tracing::debug!(
                status = response.status_code,
                media_type = selected.as_deref().unwrap_or(""),
                ?kind,
                "request completed"
            );

            let decoded = decode_body(response.content, kind, charset.as_deref());
            state.response.status = response.status_code;
            state.response.body = decoded.body;
            state.response.text = if kind.has_text() {
                response.response_text.or(decoded.text)
            } else {
                None
            };
            state.response.url = Some(response.url);
            state.last_progress
        };

        self.emit(generation, EventType::Load, progress)?;
        self.emit(generation, EventType::LoadEnd, progress)?;
        self.transition(generation, ReadyState::Done)?;
        self.settle();
        Some(())
    }

    fn on_failure(&self, generation: u64, failure: HttpFailure) -> Option<()> {
        let (prior, progress) = {
            let mut state = self.state_for(generation)?;
            state.in_flight = None;
            state.response.body = ResponseBody::default();
            state.response.text = None;
            state.failure = Some(failure.clone());
            (state.ready_state, state.last_progress)
        };

        match failure.kind {
            FailureKind::Cancelled => {
                tracing::debug!(state = %prior, "request cancelled");
                self.emit(generation, EventType::Abort, progress)?;
                self.emit(generation, EventType::LoadEnd, progress)?;
                let next = match prior {
                    ReadyState::Unsent | ReadyState::Opened | ReadyState::Done => {
                        ReadyState::Unsent
                    }
                    ReadyState::HeadersReceived | ReadyState::Loading => ReadyState::Done,
                };
                self.transition(generation, next)?;
            }
            FailureKind::Timeout => {
                tracing::debug!(state = %prior, "request timed out");
                self.emit(generation, EventType::Timeout, progress)?;
                self.transition(generation, ReadyState::Done)?;
            }
            FailureKind::Error => {
                tracing::warn!(state = %prior, "request failed: {}", failure);
                self.emit(generation, EventType::Error, progress)?;
                self.emit(generation, EventType::LoadEnd, progress)?;
                self.transition(generation, ReadyState::Done)?;
            }
        }
        self.settle();
        Some(())
    }

    fn transition(&self, generation: u64, next: ReadyState) -> Option<()> {
        self.state_for(generation)?.ready_state = next;
        tracing::trace!(state = %next, "ready state changed");
        self.notify_ready_state(next);
        Some(())
    }

    /// Dispatch to the `on*` slot, the upload channel, then main listeners
    fn emit(&self, generation: u64, event_type: EventType, progress: ProgressInfo) -> Option<()> {
        let upload_active = self.state_for(generation)?.upload_active;
        let event = ProgressEvent::new(event_type, progress);
        tracing::trace!(event = %event_type, loaded = event.loaded(), "dispatching");

        self.events.dispatch_handler(&event);
        if upload_active {
            self.is_current(generation).then_some(())?;
            self.upload.dispatch(&event);
        }
        self.is_current(generation).then_some(())?;
        self.events.dispatch_listeners(&event);
        Some(())
    }
}
