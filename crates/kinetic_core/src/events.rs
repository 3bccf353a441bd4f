//! Element event targets
//!
//! An [`EventTarget`] stands in for a DOM element (or the browser's frame
//! service): the host emits events into it and effects listen. Every listener
//! is attached through [`EventTarget::subscribe`], which hands back a
//! [`Subscription`]. Dropping or unsubscribing the handle detaches the
//! listener, after which it is never invoked again, including for the rest of
//! an emit that is already in progress.
//!
//! The model is single-threaded: targets and listeners live on the thread
//! that drives the page.
//!
//! ```rust
//! use kinetic_core::events::{EventTarget, FrameTick};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let frames = EventTarget::<FrameTick>::new();
//! let elapsed = Rc::new(Cell::new(0.0));
//!
//! let sink = elapsed.clone();
//! let sub = frames.subscribe(move |tick| sink.set(sink.get() + tick.dt_ms));
//!
//! frames.emit(&FrameTick { dt_ms: 16.0 });
//! drop(sub);
//! frames.emit(&FrameTick { dt_ms: 16.0 });
//!
//! assert_eq!(elapsed.get(), 16.0);
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::trigger::TriggerInput;

new_key_type! {
    /// Handle to an attached listener
    pub struct ListenerId;
}

/// Events the host page delivers to an element
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ElementEvent {
    /// Visible fraction of the element changed (0.0 to 1.0)
    Intersection { ratio: f32 },
    /// Pointer entered the element
    PointerEnter,
    /// Pointer left the element
    PointerLeave,
    /// Explicit activation (click or tap)
    Activate,
    /// Element became shown/hidden (document visibility, display toggles)
    Visibility(bool),
}

impl ElementEvent {
    /// Translate into trigger input, if the event can gate a trigger
    pub fn trigger_input(&self) -> Option<TriggerInput> {
        match *self {
            ElementEvent::Intersection { ratio } => Some(TriggerInput::Intersection(ratio)),
            ElementEvent::PointerEnter => Some(TriggerInput::PointerEnter),
            ElementEvent::PointerLeave => Some(TriggerInput::PointerLeave),
            ElementEvent::Activate => Some(TriggerInput::Activate),
            ElementEvent::Visibility(_) => None,
        }
    }
}

/// One animation frame from the host's frame service
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Milliseconds since the previous frame
    pub dt_ms: f32,
}

type Listener<E> = Rc<RefCell<dyn FnMut(&E)>>;
type ListenerMap<E> = RefCell<SlotMap<ListenerId, Listener<E>>>;

/// Type-erased view of a listener map, so subscriptions don't carry `E`
trait ListenerRegistry {
    fn detach(&self, id: ListenerId) -> bool;
}

impl<E> ListenerRegistry for ListenerMap<E> {
    fn detach(&self, id: ListenerId) -> bool {
        self.borrow_mut().remove(id).is_some()
    }
}

/// A source of events with explicit listener management
pub struct EventTarget<E: 'static> {
    listeners: Rc<ListenerMap<E>>,
}

impl<E: 'static> EventTarget<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    /// Attach a listener
    ///
    /// The listener stays attached until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    #[must_use = "dropping the subscription detaches the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let listener: Listener<E> = Rc::new(RefCell::new(listener));
        let id = self.listeners.borrow_mut().insert(listener);
        let registry: Rc<dyn ListenerRegistry> = self.listeners.clone();
        tracing::trace!(?id, "listener attached");

        Subscription {
            registry: Rc::downgrade(&registry),
            id,
            active: true,
        }
    }

    /// Deliver an event to every listener attached at delivery time
    ///
    /// Listeners may subscribe or unsubscribe (themselves or others) while
    /// the event is being delivered. A listener detached mid-emit is skipped.
    pub fn emit(&self, event: &E) {
        let snapshot: SmallVec<[(ListenerId, Listener<E>); 8]> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (id, Rc::clone(listener)))
            .collect();

        for (id, listener) in snapshot {
            if !self.listeners.borrow().contains_key(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(event),
                Err(_) => tracing::warn!(?id, "skipping re-entrant delivery to busy listener"),
            };
        }
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<E: 'static> Default for EventTarget<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Clone for EventTarget<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<E: 'static> fmt::Debug for EventTarget<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle keeping a listener attached
///
/// Detaches on [`Subscription::unsubscribe`] or drop. Detaching is
/// idempotent, and a subscription that outlives its target is inert.
pub struct Subscription {
    registry: Weak<dyn ListenerRegistry>,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    /// Detach the listener now
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    /// Whether the listener is still attached to a live target
    pub fn is_active(&self) -> bool {
        self.active && self.registry.strong_count() > 0
    }

    /// The listener's id within its target
    pub fn id(&self) -> ListenerId {
        self.id
    }

    fn detach(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.detach(self.id) {
                tracing::trace!(id = ?self.id, "listener detached");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
