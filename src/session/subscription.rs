//! Event subscription registry.
//!
//! Subscriptions are keyed by fully qualified event name and kept in
//! registration order. Dispatch happens in two steps: the registry is locked
//! just long enough to collect the matching handlers (removing `once` entries
//! on the spot), then the handlers run with the lock released so they may
//! subscribe or cancel freely.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::Event;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Runs on the session's event loop; must not block.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// What a subscription does with a matching event.
enum Handler {
    /// Invoke a callback.
    Callback(EventHandler),
    /// Hand the event to a single waiter.
    Waiter(oneshot::Sender<Event>),
}

/// One registered subscription.
struct Entry {
    id: SubscriptionId,
    once: bool,
    handler: Handler,
}

/// A handler collected for one dispatch.
enum Delivery {
    Callback(EventHandler),
    Waiter(oneshot::Sender<Event>),
}

impl Delivery {
    fn deliver(self, event: &Event) {
        match self {
            Self::Callback(callback) => callback(event),
            Self::Waiter(tx) => {
                let _ = tx.send(event.clone());
            }
        }
    }
}

// ============================================================================
// SubscriptionRegistry
// ============================================================================

/// Table of subscriptions for one session.
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    next_id: u64,
    entries: FxHashMap<String, Vec<Entry>>,
}

impl SubscriptionRegistry {
    /// Registers a callback.
    pub(crate) fn add_callback(&mut self, method: &str, handler: EventHandler, once: bool) -> SubscriptionId {
        self.insert(method, Handler::Callback(handler), once)
    }

    /// Registers a one-shot waiter.
    pub(crate) fn add_waiter(&mut self, method: &str, tx: oneshot::Sender<Event>) -> SubscriptionId {
        self.insert(method, Handler::Waiter(tx), true)
    }

    fn insert(&mut self, method: &str, handler: Handler, once: bool) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId::new(self.next_id);
        self.entries
            .entry(method.to_string())
            .or_default()
            .push(Entry { id, once, handler });
        trace!(%id, method, once, "Subscription added");
        id
    }

    /// Removes a subscription. Returns `true` if it was still registered.
    pub(crate) fn remove(&mut self, method: &str, id: SubscriptionId) -> bool {
        let Some(list) = self.entries.get_mut(method) else {
            return false;
        };
        let before = list.len();
        list.retain(|entry| entry.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.entries.remove(method);
        }
        removed
    }

    /// Collects handlers for an event, removing `once` entries.
    fn take_matching(&mut self, method: &str) -> Vec<Delivery> {
        let Some(list) = self.entries.get_mut(method) else {
            return Vec::new();
        };

        let mut deliveries = Vec::with_capacity(list.len());
        let mut kept = Vec::with_capacity(list.len());

        for entry in list.drain(..) {
            match entry.handler {
                Handler::Callback(callback) => {
                    deliveries.push(Delivery::Callback(Arc::clone(&callback)));
                    if !entry.once {
                        kept.push(Entry {
                            id: entry.id,
                            once: false,
                            handler: Handler::Callback(callback),
                        });
                    }
                }
                Handler::Waiter(tx) => {
                    // Waiter whose future was dropped
                    if !tx.is_closed() {
                        deliveries.push(Delivery::Waiter(tx));
                    }
                }
            }
        }

        if kept.is_empty() {
            self.entries.remove(method);
        } else {
            *list = kept;
        }

        deliveries
    }

    /// Number of live subscriptions for an event.
    pub(crate) fn count(&self, method: &str) -> usize {
        self.entries.get(method).map_or(0, Vec::len)
    }

    /// Drops every subscription. Pending waiters observe a closed channel.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Dispatches an event to the matching subscriptions of a registry.
///
/// Handlers run after the registry lock is released, in registration order.
pub(crate) fn dispatch(registry: &Mutex<SubscriptionRegistry>, event: &Event) -> usize {
    let deliveries = registry.lock().take_matching(&event.method);
    let count = deliveries.len();
    for delivery in deliveries {
        delivery.deliver(event);
    }
    count
}

// ============================================================================
// Subscription
// ============================================================================

/// Cancellation handle for a registered subscription.
///
/// Dropping the handle does not cancel the subscription; call
/// [`Subscription::cancel`] explicitly.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    method: String,
    registry: Weak<Mutex<SubscriptionRegistry>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("method", &self.method)
            .finish()
    }
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, method: String, registry: &Arc<Mutex<SubscriptionRegistry>>) -> Self {
        Self {
            id,
            method,
            registry: Arc::downgrade(registry),
        }
    }

    /// A handle for a registration refused because the session is closed.
    pub(crate) fn detached(method: String) -> Self {
        Self {
            id: SubscriptionId::new(0),
            method,
            registry: Weak::new(),
        }
    }

    /// Returns the subscription id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the subscribed event name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Removes the subscription.
    ///
    /// Returns `false` if it was already gone (fired once, cancelled, or the
    /// session has closed).
    pub fn cancel(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.lock().remove(&self.method, self.id),
            None => false,
        }
    }
}

// ============================================================================
// EventWaiter
// ============================================================================

/// Future resolving with the next occurrence of an event.
///
/// The subscription is registered when the waiter is created, so an event
/// arriving before the waiter is first polled is not lost. Dropping the
/// waiter cancels the subscription.
///
/// # Errors
///
/// Resolves to [`Error::SessionClosed`] if the session closes first.
pub struct EventWaiter {
    rx: oneshot::Receiver<Event>,
    subscription: Option<Subscription>,
}

impl fmt::Debug for EventWaiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWaiter")
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl EventWaiter {
    pub(crate) fn new(rx: oneshot::Receiver<Event>, subscription: Subscription) -> Self {
        Self {
            rx,
            subscription: Some(subscription),
        }
    }

    /// A waiter that fails immediately with [`Error::SessionClosed`].
    pub(crate) fn closed() -> Self {
        let (_, rx) = oneshot::channel();
        Self {
            rx,
            subscription: None,
        }
    }

    /// Returns the underlying subscription.
    #[must_use]
    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }
}

impl Future for EventWaiter {
    type Output = Result<Event>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(event)) => {
                this.subscription = None;
                Poll::Ready(Ok(event))
            }
            Poll::Ready(Err(_)) => {
                this.subscription = None;
                Poll::Ready(Err(Error::SessionClosed))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for EventWaiter {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
