#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Synchronous publish/subscribe channel shared by every Berry Grove system.
//!
//! The world constructs a single [`EventChannel`] and hands out `Rc` handles
//! to each component that publishes or listens. Dispatch is synchronous and
//! follows registration order. Every publish walks a snapshot of the
//! subscribers captured when dispatch starts, so handlers may subscribe,
//! unsubscribe or publish again without disturbing the dispatch in progress.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
};

use berry_grove_core::{Event, EventKind};
use log::trace;

type Handler = Rc<dyn Fn(&Event)>;

/// Handle returned by [`EventChannel::subscribe`] and accepted by
/// [`EventChannel::unsubscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

/// Event bus routing [`Event`] values to subscribers registered per
/// [`EventKind`].
#[derive(Default)]
pub struct EventChannel {
    subscribers: RefCell<BTreeMap<EventKind, Vec<Subscription>>>,
    next_id: Cell<u64>,
}

impl EventChannel {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every subsequent publish of `kind`.
    pub fn subscribe(&self, kind: EventKind, handler: impl Fn(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Subscription {
                id,
                handler: Rc::new(handler),
            });
        trace!("subscription {} registered for {kind:?}", id.0);
        id
    }

    /// Removes a subscription. Returns `false` if the handle was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        for list in subscribers.values_mut() {
            if let Some(index) = list.iter().position(|subscription| subscription.id == id) {
                let _ = list.remove(index);
                trace!("subscription {} removed", id.0);
                return true;
            }
        }
        false
    }

    /// Delivers `event` to every handler registered for its kind.
    pub fn publish(&self, event: Event) {
        let snapshot: Vec<Handler> = match self.subscribers.borrow().get(&event.kind()) {
            Some(list) => list
                .iter()
                .map(|subscription| Rc::clone(&subscription.handler))
                .collect(),
            None => Vec::new(),
        };

        trace!("publishing {event:?} to {} subscriber(s)", snapshot.len());
        for handler in snapshot {
            handler(&event);
        }
    }

    /// Number of handlers currently registered for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.borrow().get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.borrow();
        let mut map = f.debug_map();
        for (kind, list) in subscribers.iter() {
            let _ = map.entry(kind, &list.len());
        }
        map.finish()
    }
}
