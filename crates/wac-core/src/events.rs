//! Session event bus.
//!
//! A small typed publish/subscribe channel used to ask the root controller
//! for a forced logout without holding a reference to it. Each event kind
//! has a single listener slot: registering again replaces the previous
//! handler. Registration returns a [`Subscription`] that frees the slot
//! when dropped, unless a newer registration has taken it over since.
//!
//! Dispatch is synchronous on the caller's context. The registry lock is
//! released before the handler runs, so handlers may use the bus.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// A notification carried on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// The session is no longer valid and must be torn down.
    Logout,
}

impl SessionEvent {
    pub fn name(self) -> &'static str {
        match self {
            SessionEvent::Logout => "logout",
        }
    }
}

/// Unique identifier for a registered listener.
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

type Handler = Arc<dyn Fn(SessionEvent) + Send + Sync>;

struct Slot {
    id: ListenerId,
    handler: Handler,
}

type Slots = Mutex<HashMap<SessionEvent, Slot>>;

/// Process-wide notification channel, shared by cloning.
#[derive(Clone, Default)]
pub struct SessionEventBus {
    slots: Arc<Slots>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`, replacing any previous listener.
    pub fn on<F>(&self, event: SessionEvent, handler: F) -> Subscription
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst);
        let replaced = self.slots.lock().insert(
            event,
            Slot {
                id,
                handler: Arc::new(handler),
            },
        );
        if let Some(previous) = replaced {
            tracing::debug!(event = event.name(), previous = previous.id, id, "listener replaced");
        } else {
            tracing::debug!(event = event.name(), id, "listener registered");
        }

        Subscription {
            event,
            id,
            slots: Some(Arc::downgrade(&self.slots)),
        }
    }

    /// Deregisters whatever listener holds the slot. Returns whether one did.
    pub fn remove(&self, event: SessionEvent) -> bool {
        let removed = self.slots.lock().remove(&event);
        removed.is_some()
    }

    pub fn has_listener(&self, event: SessionEvent) -> bool {
        self.slots.lock().contains_key(&event)
    }

    /// Invokes the registered listener, if any. Returns whether one ran.
    pub fn dispatch(&self, event: SessionEvent) -> bool {
        let handler = self
            .slots
            .lock()
            .get(&event)
            .map(|slot| Arc::clone(&slot.handler));

        match handler {
            Some(handler) => {
                tracing::debug!(event = event.name(), "dispatching");
                handler(event);
                true
            }
            None => {
                tracing::debug!(event = event.name(), "no listener");
                false
            }
        }
    }
}

impl fmt::Debug for SessionEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<&'static str> = self.slots.lock().keys().map(|e| e.name()).collect();
        f.debug_struct("SessionEventBus")
            .field("listeners", &events)
            .finish()
    }
}

/// RAII handle for a bus registration.
///
/// Holds a weak reference to the registry, so dropping it after the bus is
/// gone is a no-op.
pub struct Subscription {
    event: SessionEvent,
    id: ListenerId,
    slots: Option<Weak<Slots>>,
}

impl Subscription {
    /// Explicitly unsubscribes. Equivalent to dropping.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(slots) = self.slots.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        let removed = {
            let mut slots = slots.lock();
            if slots.get(&self.event).is_some_and(|slot| slot.id == self.id) {
                slots.remove(&self.event)
            } else {
                None
            }
        };
        if removed.is_some() {
            tracing::debug!(event = self.event.name(), id = self.id, "listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Capability handed to anything that can notice an expired session.
pub trait SessionInvalidationListener: Send + Sync {
    fn session_invalidated(&self);
}

impl SessionInvalidationListener for SessionEventBus {
    fn session_invalidated(&self) {
        self.dispatch(SessionEvent::Logout);
    }
}
