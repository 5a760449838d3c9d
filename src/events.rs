//! Listener registries for progress events

use crate::progress::{EventType, ProgressEvent};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Progress event listener.
///
/// Listeners run on the request's own task and may call back into the request
/// object, including registering or removing listeners.
pub type Listener = Rc<dyn Fn(&ProgressEvent)>;

/// Wrap a closure as a [`Listener`]
pub fn listener(f: impl Fn(&ProgressEvent) + 'static) -> Listener {
    Rc::new(f)
}

/// Named event registry with one `on*` slot and an ordered listener list per
/// event type.
#[derive(Default)]
pub struct EventTarget {
    listeners: RefCell<HashMap<EventType, Vec<Listener>>>,
    handlers: RefCell<HashMap<EventType, Listener>>,
}

impl EventTarget {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; the same listener may be registered more than once
    pub fn add_event_listener(&self, event_type: EventType, listener: Listener) {
        self.listeners
            .borrow_mut()
            .entry(event_type)
            .or_default()
            .push(listener);
    }

    /// Remove every registration of `listener` for `event_type`.
    ///
    /// Listeners are matched by identity. Returns whether anything was removed.
    pub fn remove_event_listener(&self, event_type: EventType, listener: &Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(registered) = listeners.get_mut(&event_type) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|l| !std::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(listener)));
        before != registered.len()
    }

    /// Number of listeners for `event_type`, not counting the `on*` slot
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.listeners
            .borrow()
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    /// Replace the `on*` slot for `event_type`
    pub fn set_event_handler(&self, event_type: EventType, handler: Option<Listener>) {
        let mut handlers = self.handlers.borrow_mut();
        match handler {
            Some(handler) => {
                handlers.insert(event_type, handler);
            }
            None => {
                handlers.remove(&event_type);
            }
        }
    }

    /// Current `on*` slot for `event_type`
    pub fn event_handler(&self, event_type: EventType) -> Option<Listener> {
        self.handlers.borrow().get(&event_type).cloned()
    }

    /// Invoke the `on*` slot for the event's type
    pub(crate) fn dispatch_handler(&self, event: &ProgressEvent) {
        // borrow released before calling out
        if let Some(handler) = self.event_handler(event.event_type()) {
            handler(event);
        }
    }

    /// Invoke the listeners registered for the event's type, in order.
    ///
    /// The list is snapshotted first; changes made by a listener apply from
    /// the next dispatch.
    pub(crate) fn dispatch_listeners(&self, event: &ProgressEvent) {
        let snapshot = self
            .listeners
            .borrow()
            .get(&event.event_type())
            .cloned()
            .unwrap_or_default();
        for listener in snapshot {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<EventType, usize> = self
            .listeners
            .borrow()
            .iter()
            .map(|(ty, l)| (*ty, l.len()))
            .collect();
        let slots: Vec<EventType> = self.handlers.borrow().keys().copied().collect();
        f.debug_struct("EventTarget")
            .field("listeners", &counts)
            .field("handlers", &slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Listener {
        let log = log.clone();
        listener(move |e| log.borrow_mut().push(format!("{} {}", tag, e.event_type())))
    }

    #[test]
    fn test_registration_order() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        target.add_event_listener(EventType::Load, recorder(&log, "a"));
        target.add_event_listener(EventType::Load, recorder(&log, "b"));
        target.add_event_listener(EventType::Error, recorder(&log, "c"));

        target.dispatch_listeners(&ProgressEvent::empty(EventType::Load));
        assert_eq!(*log.borrow(), vec!["a load", "b load"]);
    }

    #[test]
    fn test_remove_by_identity() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");
        target.add_event_listener(EventType::Progress, a.clone());
        target.add_event_listener(EventType::Progress, b.clone());

        // an equivalent closure is a different listener
        assert!(!target.remove_event_listener(EventType::Progress, &recorder(&log, "a")));
        assert!(target.remove_event_listener(EventType::Progress, &a));
        assert_eq!(target.listener_count(EventType::Progress), 1);

        target.dispatch_listeners(&ProgressEvent::empty(EventType::Progress));
        assert_eq!(*log.borrow(), vec!["b progress"]);
    }

    #[test]
    fn test_listener_may_mutate_registry() {
        let target = Rc::new(EventTarget::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let late = recorder(&log, "late");
        let target_ref = Rc::downgrade(&target);
        target.add_event_listener(
            EventType::LoadEnd,
            listener(move |_| {
                if let Some(target) = target_ref.upgrade() {
                    target.add_event_listener(EventType::LoadEnd, late.clone());
                }
            }),
        );

        target.dispatch_listeners(&ProgressEvent::empty(EventType::LoadEnd));
        assert!(log.borrow().is_empty());
        target.dispatch_listeners(&ProgressEvent::empty(EventType::LoadEnd));
        assert_eq!(*log.borrow(), vec!["late loadend"]);
    }

    #[test]
    fn test_handler_slot() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        target.set_event_handler(EventType::Abort, Some(recorder(&log, "first")));
        target.set_event_handler(EventType::Abort, Some(recorder(&log, "second")));

        target.dispatch_handler(&ProgressEvent::empty(EventType::Abort));
        target.set_event_handler(EventType::Abort, None);
        target.dispatch_handler(&ProgressEvent::empty(EventType::Abort));

        assert_eq!(*log.borrow(), vec!["second abort"]);
        assert_eq!(target.listener_count(EventType::Abort), 0);
    }
}
