//! Upload progress channel

use crate::events::{EventTarget, Listener};
use crate::progress::{EventType, ProgressEvent};
use std::rc::Rc;

/// Listener registry for outbound body transfer.
///
/// Receives the same event names as the request object, but only for methods
/// that carry a request body (POST and PUT).
#[derive(Clone, Debug, Default)]
pub struct XmlHttpRequestUpload {
    target: Rc<EventTarget>,
}

impl XmlHttpRequestUpload {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add_event_listener(&self, event_type: EventType, listener: Listener) {
        self.target.add_event_listener(event_type, listener);
    }

    /// Remove a listener by identity
    pub fn remove_event_listener(&self, event_type: EventType, listener: &Listener) -> bool {
        self.target.remove_event_listener(event_type, listener)
    }

    /// Set or clear the `on*` slot
    pub fn set_event_handler(&self, event_type: EventType, handler: Option<Listener>) {
        self.target.set_event_handler(event_type, handler);
    }

    pub(crate) fn dispatch(&self, event: &ProgressEvent) {
        self.target.dispatch_handler(event);
        self.target.dispatch_listeners(event);
    }
}
